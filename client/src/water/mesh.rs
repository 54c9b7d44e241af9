//! Bevy meshes for the water surface and its pointer proxy.

use bevy::{
    prelude::*,
    render::mesh::{Indices, Mesh, PrimitiveTopology, VertexAttributeValues},
};
use shared::water::{FieldGrid, GridConfig, SurfaceMesh};

/// Marks the visible, displaced surface.
#[derive(Component)]
pub struct WaterSurface;

/// Marks the invisible flat quad the pointer ray is cast against.
#[derive(Component)]
pub struct PointerProxy;

pub fn build_mesh(surface: SurfaceMesh) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, surface.positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, surface.normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, surface.uvs);
    mesh.insert_indices(Indices::U32(surface.indices));
    mesh
}

pub fn surface_mesh(grid: &GridConfig) -> Mesh {
    build_mesh(SurfaceMesh::grid(grid))
}

pub fn proxy_mesh(grid: &GridConfig) -> Mesh {
    build_mesh(SurfaceMesh::proxy(grid))
}

/// Reads the vertex data of a surface mesh back into [`SurfaceMesh`] form.
///
/// Returns `None` if the mesh lacks float positions, normals or UVs.
pub fn read_surface(mesh: &Mesh) -> Option<SurfaceMesh> {
    let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION)? {
        VertexAttributeValues::Float32x3(values) => values.clone(),
        _ => return None,
    };
    let normals = match mesh.attribute(Mesh::ATTRIBUTE_NORMAL)? {
        VertexAttributeValues::Float32x3(values) => values.clone(),
        _ => return None,
    };
    let uvs = match mesh.attribute(Mesh::ATTRIBUTE_UV_0)? {
        VertexAttributeValues::Float32x2(values) => values.clone(),
        _ => return None,
    };
    Some(SurfaceMesh {
        positions,
        normals,
        uvs,
        indices: Vec::new(),
    })
}

/// Applies `field` to `mesh` on the CPU. Indices are left untouched.
pub fn displace_mesh(mesh: &mut Mesh, field: &FieldGrid, grid: &GridConfig) -> bool {
    let Some(mut surface) = read_surface(mesh) else {
        return false;
    };
    surface.apply_field(field, grid);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, surface.positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, surface.normals);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::water::FieldCell;

    #[test]
    fn test_surface_mesh_has_one_vertex_per_texel() {
        let grid = GridConfig::new(16, 64.0).unwrap();
        let mesh = surface_mesh(&grid);
        assert_eq!(mesh.count_vertices(), 256);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(15 * 15 * 6));
    }

    #[test]
    fn test_proxy_is_a_single_quad() {
        let grid = GridConfig::new(16, 64.0).unwrap();
        let mesh = proxy_mesh(&grid);
        assert_eq!(mesh.count_vertices(), 4);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(6));
    }

    #[test]
    fn test_cpu_displacement_writes_heights() {
        let grid = GridConfig::new(4, 8.0).unwrap();
        let mut field = FieldGrid::new(4);
        field.set(0, 0, FieldCell::at_rest(2.5));
        let mut mesh = surface_mesh(&grid);

        assert!(displace_mesh(&mut mesh, &field, &grid));
        let surface = read_surface(&mesh).unwrap();
        assert_eq!(surface.positions[0][1], 2.5);
        assert_eq!(surface.positions[5][1], 0.0);
    }
}
