//! The simulated water surface.
//!
//! ```text
//!  pointer ──► input ──► PendingDisturbance
//!                              │
//!                           driver ── GPU: pack uniforms, swap textures ──► compute node
//!                              │   └─ CPU: FieldStore::step ──► displace mesh
//!                              ▼
//!                         surface material / mesh
//! ```

pub mod compute;
pub mod driver;
pub mod input;
pub mod material;
pub mod mesh;
pub mod simulation;

use bevy::{pbr::MaterialPlugin, prelude::*, render::view::NoFrustumCulling};
use shared::{sets::WaterUpdateSet, water::FieldStore};

use compute::FieldComputePlugin;
use driver::{displace_cpu_surface, hand_off_field_texture, step_cpu_field, step_gpu_field};
use input::{record_pointer_disturbance, PrimaryTouch};
use material::{
    create_surface_material, water_base, FieldSurfaceMaterial, FieldSurfaceMaterialHandle,
};
use mesh::{proxy_mesh, surface_mesh, PointerProxy, WaterSurface};
use simulation::{setup_field_simulation, FieldTextures, SurfaceGrid};

use crate::shaders::ShadersPlugin;

pub struct WaterPlugin;

impl Plugin for WaterPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ShadersPlugin,
            MaterialPlugin::<FieldSurfaceMaterial> {
                prepass_enabled: false,
                shadows_enabled: false,
                ..default()
            },
            FieldComputePlugin,
        ))
        .init_resource::<PrimaryTouch>()
        .configure_sets(
            Update,
            (
                WaterUpdateSet::Input,
                WaterUpdateSet::Simulation,
                WaterUpdateSet::Rendering,
                WaterUpdateSet::Ui,
            )
                .chain(),
        )
        .add_systems(Startup, (setup_field_simulation, spawn_water_surface).chain())
        .add_systems(
            Update,
            (
                record_pointer_disturbance
                    .in_set(WaterUpdateSet::Input)
                    .run_if(resource_exists::<SurfaceGrid>),
                (
                    step_gpu_field.run_if(resource_exists::<FieldTextures>),
                    step_cpu_field.run_if(resource_exists::<FieldStore>),
                )
                    .in_set(WaterUpdateSet::Simulation),
                (
                    hand_off_field_texture.run_if(resource_exists::<FieldSurfaceMaterialHandle>),
                    displace_cpu_surface.run_if(resource_exists::<FieldStore>),
                )
                    .in_set(WaterUpdateSet::Rendering),
            ),
        );
    }
}

/// Spawns the visible surface for whichever backend was set up, plus the
/// hidden proxy quad the pointer is mapped against.
fn spawn_water_surface(
    mut commands: Commands,
    grid: Res<SurfaceGrid>,
    textures: Option<Res<FieldTextures>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut standard_materials: ResMut<Assets<StandardMaterial>>,
    mut field_materials: ResMut<Assets<FieldSurfaceMaterial>>,
) {
    commands.spawn((
        Name::new("PointerProxy"),
        PointerProxy,
        Mesh3d(meshes.add(proxy_mesh(&grid))),
        Transform::default(),
        Visibility::Hidden,
    ));

    // Displaced heights leave the flat mesh bounds, so culling is disabled.
    let surface = meshes.add(surface_mesh(&grid));
    match textures {
        Some(textures) => {
            let material = field_materials.add(create_surface_material(
                textures.buffers.current().clone(),
                &grid,
            ));
            commands.insert_resource(FieldSurfaceMaterialHandle(material.clone()));
            commands.spawn((
                Name::new("WaterSurface"),
                WaterSurface,
                Mesh3d(surface),
                MeshMaterial3d(material),
                Transform::default(),
                NoFrustumCulling,
            ));
        }
        None => {
            commands.spawn((
                Name::new("WaterSurface"),
                WaterSurface,
                Mesh3d(surface),
                MeshMaterial3d(standard_materials.add(water_base())),
                Transform::default(),
                NoFrustumCulling,
            ));
        }
    }
}
