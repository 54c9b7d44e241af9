//! Surface material for the GPU backend.
//!
//! Extends `StandardMaterial` with the current field texture; the vertex
//! stage in `surface.wgsl` reads heights and normals from it.

use bevy::{
    pbr::{ExtendedMaterial, MaterialExtension, StandardMaterial},
    prelude::*,
    render::render_resource::{AsBindGroup, ShaderRef},
};
use shared::water::GridConfig;

use crate::shaders::{paths, uniforms::SurfaceUniform};

/// Material extension carrying the field texture the vertex stage samples.
#[derive(Asset, AsBindGroup, TypePath, Debug, Clone)]
pub struct FieldSurfaceExtension {
    /// Replaced by the freshly written buffer after every step.
    #[texture(100, sample_type = "float", filterable = false, visibility(vertex))]
    pub field: Handle<Image>,

    #[uniform(101)]
    pub surface: SurfaceUniform,
}

impl MaterialExtension for FieldSurfaceExtension {
    fn vertex_shader() -> ShaderRef {
        paths::SURFACE_SHADER.into()
    }
}

/// Type alias for the complete surface material.
pub type FieldSurfaceMaterial = ExtendedMaterial<StandardMaterial, FieldSurfaceExtension>;

/// Handle to the one surface material, rebound to a new texture each frame.
#[derive(Resource)]
pub struct FieldSurfaceMaterialHandle(pub Handle<FieldSurfaceMaterial>);

/// PBR base shared by both backends.
pub fn water_base() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgb(0.1, 0.35, 0.55),
        perceptual_roughness: 0.15,
        reflectance: 0.5,
        metallic: 0.0,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

pub fn create_surface_material(field: Handle<Image>, grid: &GridConfig) -> FieldSurfaceMaterial {
    ExtendedMaterial {
        base: water_base(),
        extension: FieldSurfaceExtension {
            field,
            surface: SurfaceUniform::new(grid),
        },
    }
}
