//! Frame driver systems for both backends.
//!
//! Order within a frame: pointer samples are recorded, the driver takes
//! the pending disturbance and steps once, then the fresh buffer reaches the
//! surface (material rebind on the GPU, mesh rewrite on the CPU).

use bevy::prelude::*;
use shared::water::{
    drive_frame, FieldStepper, FieldStore, PendingDisturbance, SimulationParams, StepInput,
};

use super::{
    material::{FieldSurfaceMaterial, FieldSurfaceMaterialHandle},
    mesh::{displace_mesh, WaterSurface},
    simulation::{FieldTextures, SurfaceGrid},
};
use crate::shaders::uniforms::FieldUniforms;

/// Schedules one GPU step: packs this frame's uniforms and promotes the
/// scratch texture. The dispatch itself runs in the render graph.
pub struct GpuStepper<'a> {
    pub textures: &'a mut FieldTextures,
    pub uniforms: &'a mut FieldUniforms,
}

impl FieldStepper for GpuStepper<'_> {
    fn resolution(&self) -> u32 {
        self.uniforms.resolution
    }

    fn step(&mut self, params: &SimulationParams, input: &StepInput) {
        *self.uniforms = FieldUniforms::new(params, input);
        self.textures.buffers.swap();
    }
}

pub fn step_gpu_field(
    time: Res<Time>,
    mut params: ResMut<SimulationParams>,
    mut pending: ResMut<PendingDisturbance>,
    mut textures: ResMut<FieldTextures>,
    mut uniforms: ResMut<FieldUniforms>,
) {
    let mut stepper = GpuStepper {
        textures: &mut *textures,
        uniforms: &mut *uniforms,
    };
    drive_frame(&mut stepper, &mut params, &mut pending, time.delta_secs());
}

/// Points the surface material at the texture the current step writes.
pub fn hand_off_field_texture(
    textures: Res<FieldTextures>,
    handle: Res<FieldSurfaceMaterialHandle>,
    mut materials: ResMut<Assets<FieldSurfaceMaterial>>,
) {
    let current = textures.buffers.current();
    if let Some(material) = materials.get_mut(&handle.0) {
        material.extension.field = current.clone();
    }
}

pub fn step_cpu_field(
    time: Res<Time>,
    mut params: ResMut<SimulationParams>,
    mut pending: ResMut<PendingDisturbance>,
    mut store: ResMut<FieldStore>,
) {
    drive_frame(&mut *store, &mut params, &mut pending, time.delta_secs());
}

pub fn displace_cpu_surface(
    store: Res<FieldStore>,
    grid: Res<SurfaceGrid>,
    surfaces: Query<&Mesh3d, With<WaterSurface>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    if !store.is_changed() {
        return;
    }
    for mesh in &surfaces {
        if let Some(mesh) = meshes.get_mut(&mesh.0) {
            if !displace_mesh(mesh, store.current_field(), &grid.0) {
                warn_once!("Water surface mesh lacks position, normal or uv data");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::water::{FieldFormat, PingPong, Slot};

    fn textures() -> FieldTextures {
        FieldTextures {
            buffers: PingPong::new(Handle::weak_from_u128(1), Handle::weak_from_u128(2)),
            format: FieldFormat::Rgba32Float,
        }
    }

    #[test]
    fn test_gpu_step_swaps_and_packs_uniforms() {
        let mut textures = textures();
        let mut params = SimulationParams::default();
        let mut uniforms = FieldUniforms::at_rest(&params, 64);
        let mut pending = PendingDisturbance::default();
        pending.record(Some(Vec2::new(3.0, 5.0)));

        {
            let mut stepper = GpuStepper {
                textures: &mut textures,
                uniforms: &mut uniforms,
            };
            drive_frame(&mut stepper, &mut params, &mut pending, 0.02);
        }

        assert_eq!(textures.buffers.current_slot(), Slot::B);
        assert_eq!(uniforms.disturbance_active, 1);
        assert_eq!(uniforms.disturbance, Vec2::new(3.0, 5.0));
        assert_eq!(uniforms.resolution, 64);
        assert!((uniforms.elapsed_time - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_gpu_disturbance_clears_next_frame() {
        let mut textures = textures();
        let mut params = SimulationParams::default();
        let mut uniforms = FieldUniforms::at_rest(&params, 64);
        let mut pending = PendingDisturbance::default();
        pending.record(Some(Vec2::ONE));

        for _ in 0..2 {
            let mut stepper = GpuStepper {
                textures: &mut textures,
                uniforms: &mut uniforms,
            };
            drive_frame(&mut stepper, &mut params, &mut pending, 0.02);
        }

        assert_eq!(uniforms.disturbance_active, 0);
        assert_eq!(textures.buffers.current_slot(), Slot::A);
    }
}
