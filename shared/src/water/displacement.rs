//! Field-to-geometry displacement.
//!
//! Reference implementation of the per-vertex stage `surface.wgsl` runs on
//! the GPU. The CPU backend applies it to the render mesh directly.

use bevy::math::{Vec2, Vec3};

use super::field::FieldGrid;
use super::grid::GridConfig;

/// Texel addressed by `uv`, clamped so `uv = 1` maps onto the last texel.
pub fn texel_for_uv(uv: Vec2, resolution: u32) -> (u32, u32) {
    let w = resolution as f32;
    let last = resolution.saturating_sub(1);
    let axis = |t: f32| ((t.clamp(0.0, 1.0) * w).floor() as u32).min(last);
    (axis(uv.x), axis(uv.y))
}

pub fn sample_height(field: &FieldGrid, uv: Vec2) -> f32 {
    let (i, j) = texel_for_uv(uv, field.resolution());
    field.height(i, j)
}

/// Normal from central differences one texel apart, wrapping at the edges.
///
/// Height differences are scaled by `W / B` so the slope stays the same when
/// the grid resolution changes.
pub fn surface_normal(field: &FieldGrid, uv: Vec2, grid: &GridConfig) -> Vec3 {
    let (i, j) = texel_for_uv(uv, field.resolution());
    let (i, j) = (i as i64, j as i64);
    let scale = grid.world_to_field_scale();

    let dx = field.get_wrapped(i - 1, j).height - field.get_wrapped(i + 1, j).height;
    let dz = field.get_wrapped(i, j - 1).height - field.get_wrapped(i, j + 1).height;

    Vec3::new(dx * scale, 1.0, dz * scale).normalize()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub height: f32,
    pub normal: Vec3,
}

pub fn displace(field: &FieldGrid, uv: Vec2, grid: &GridConfig) -> SurfaceSample {
    SurfaceSample {
        height: sample_height(field, uv),
        normal: surface_normal(field, uv, grid),
    }
}

/// Engine-neutral vertex data for the water surface.
///
/// Positions are local to the surface center; `y` is the displaced axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    /// `W × W` vertices spanning the grid footprint, one per texel.
    pub fn grid(grid: &GridConfig) -> Self {
        let verts_per_side = grid.resolution().max(2);
        let quads_per_side = verts_per_side - 1;
        let extent = grid.extent();
        let half = extent * 0.5;
        let quads = quads_per_side as f32;

        let vertex_count = verts_per_side as usize * verts_per_side as usize;
        let mut mesh = Self {
            positions: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            uvs: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(quads_per_side as usize * quads_per_side as usize * 6),
        };

        for row in 0..verts_per_side {
            for col in 0..verts_per_side {
                let u = col as f32 / quads;
                let v = row as f32 / quads;
                mesh.positions.push([u * extent - half, 0.0, v * extent - half]);
                mesh.normals.push([0.0, 1.0, 0.0]);
                mesh.uvs.push([u, v]);
            }
        }

        for row in 0..quads_per_side {
            for col in 0..quads_per_side {
                let tl = row * verts_per_side + col;
                let tr = tl + 1;
                let bl = tl + verts_per_side;
                let br = bl + 1;
                // Counterclockwise seen from +Y.
                mesh.indices.extend_from_slice(&[tl, bl, tr]);
                mesh.indices.extend_from_slice(&[tr, bl, br]);
            }
        }

        mesh
    }

    /// One flat quad with the same footprint; the pointer proxy.
    pub fn proxy(grid: &GridConfig) -> Self {
        let half = grid.extent() * 0.5;
        Self {
            positions: vec![
                [-half, 0.0, -half],
                [half, 0.0, -half],
                [-half, 0.0, half],
                [half, 0.0, half],
            ],
            normals: vec![[0.0, 1.0, 0.0]; 4],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            indices: vec![0, 2, 1, 1, 2, 3],
        }
    }

    /// Writes displaced heights and normals from `field` into the vertices.
    pub fn apply_field(&mut self, field: &FieldGrid, grid: &GridConfig) {
        for ((position, normal), uv) in self
            .positions
            .iter_mut()
            .zip(self.normals.iter_mut())
            .zip(self.uvs.iter())
        {
            let sample = displace(field, Vec2::from(*uv), grid);
            position[1] = sample.height;
            *normal = sample.normal.to_array();
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::field::FieldCell;

    fn grid(resolution: u32, extent: f32) -> GridConfig {
        GridConfig::new(resolution, extent).unwrap()
    }

    #[test]
    fn test_uv_to_texel() {
        assert_eq!(texel_for_uv(Vec2::ZERO, 8), (0, 0));
        assert_eq!(texel_for_uv(Vec2::ONE, 8), (7, 7));
        assert_eq!(texel_for_uv(Vec2::new(0.5, 0.26), 8), (4, 2));
        assert_eq!(texel_for_uv(Vec2::new(-0.2, 1.4), 8), (0, 7));
    }

    #[test]
    fn test_flat_field_has_upright_normals() {
        let field = FieldGrid::new(8);
        let sample = displace(&field, Vec2::splat(0.3), &grid(8, 32.0));
        assert_eq!(sample.height, 0.0);
        assert!((sample.normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_normal_tilts_away_from_higher_side() {
        let resolution = 8;
        let mut field = FieldGrid::new(resolution);
        for j in 0..resolution {
            for i in 0..resolution {
                field.set(i, j, FieldCell::at_rest(i as f32));
            }
        }
        let normal = surface_normal(&field, Vec2::new(0.5, 0.5), &grid(resolution, 32.0));
        assert!(normal.x < 0.0);
        assert!(normal.z.abs() < 1e-6);
        assert!((normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_normal_slope_is_resolution_independent() {
        // Same world-space slope (0.1 height per world unit) on two grids.
        let slope = 0.1;
        let normal_at = |resolution: u32| {
            let config = grid(resolution, 64.0);
            let cell = 64.0 / resolution as f32;
            let mut field = FieldGrid::new(resolution);
            for j in 0..resolution {
                for i in 0..resolution {
                    field.set(i, j, FieldCell::at_rest(i as f32 * cell * slope));
                }
            }
            surface_normal(&field, Vec2::new(0.5, 0.5), &config)
        };
        let coarse = normal_at(16);
        let fine = normal_at(64);
        assert!((coarse - fine).length() < 1e-4, "{coarse} vs {fine}");
    }

    #[test]
    fn test_normal_wraps_at_edges() {
        let resolution = 8;
        let mut field = FieldGrid::new(resolution);
        field.set(resolution - 1, 0, FieldCell::at_rest(2.0));
        // Texel (0, 0) sees the raised cell as its west neighbor.
        let normal = surface_normal(&field, Vec2::ZERO, &grid(resolution, 32.0));
        assert!(normal.x > 0.0);
    }

    #[test]
    fn test_grid_mesh_layout() {
        let config = grid(4, 8.0);
        let mesh = SurfaceMesh::grid(&config);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.indices.len(), 3 * 3 * 6);
        assert_eq!(mesh.positions[0], [-4.0, 0.0, -4.0]);
        assert_eq!(mesh.positions[15], [4.0, 0.0, 4.0]);
        assert_eq!(mesh.uvs[15], [1.0, 1.0]);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_grid_mesh_faces_up() {
        let mesh = SurfaceMesh::grid(&grid(4, 8.0));
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn test_proxy_matches_footprint() {
        let config = grid(128, 512.0);
        let proxy = SurfaceMesh::proxy(&config);
        let surface = SurfaceMesh::grid(&config);
        let bounds = |mesh: &SurfaceMesh| {
            mesh.positions.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
                (lo.min(p[0]).min(p[2]), hi.max(p[0]).max(p[2]))
            })
        };
        assert_eq!(bounds(&proxy), bounds(&surface));
        for tri in proxy.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(proxy.positions[i as usize]));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn test_apply_field_displaces_vertices() {
        let config = grid(4, 8.0);
        let mut field = FieldGrid::new(4);
        field.set(3, 3, FieldCell::at_rest(1.5));
        let mut mesh = SurfaceMesh::grid(&config);
        mesh.apply_field(&field, &config);

        // The last vertex has uv (1, 1) and addresses texel (3, 3).
        assert_eq!(mesh.positions[15][1], 1.5);
        assert_eq!(mesh.positions[0][1], 0.0);
        // x and z are never touched.
        assert_eq!(mesh.positions[15][0], 4.0);
        assert_ne!(mesh.normals[14], [0.0, 1.0, 0.0]);
    }
}
