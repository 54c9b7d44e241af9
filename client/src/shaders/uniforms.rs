//! Uniform blocks shared with `field_update.wgsl` and `surface.wgsl`.
//!
//! Field order and types here must match the WGSL structs. Dead code is
//! allowed for the whole module because `ShaderType` emits unused `check`
//! helpers.

#![allow(dead_code)]

use bevy::{
    prelude::*,
    render::{extract_resource::ExtractResource, render_resource::ShaderType},
};
use shared::water::{GridConfig, SimulationParams, StepInput};

/// Per-step kernel inputs (matches WGSL `FieldUniforms`).
#[derive(Resource, ExtractResource, ShaderType, Debug, Clone, Copy, PartialEq)]
pub struct FieldUniforms {
    pub resolution: u32,
    /// `UpdateRule::shader_index`
    pub rule: u32,
    /// Non-zero when `disturbance` is valid this step.
    pub disturbance_active: u32,
    pub viscosity: f32,
    pub relaxation: f32,
    pub disturbance_radius: f32,
    pub disturbance_strength: f32,
    pub height_compensation: f32,
    /// Field-space disturbance point.
    pub disturbance: Vec2,
    pub elapsed_time: f32,
    pub dt: f32,
}

impl FieldUniforms {
    pub fn new(params: &SimulationParams, input: &StepInput) -> Self {
        Self {
            resolution: input.resolution,
            rule: params.rule().shader_index(),
            disturbance_active: input.disturbance.is_some() as u32,
            viscosity: params.viscosity(),
            relaxation: params.relaxation(),
            disturbance_radius: params.disturbance_radius(),
            disturbance_strength: params.disturbance_strength(),
            height_compensation: params.height_compensation(),
            disturbance: input.disturbance.unwrap_or(Vec2::ZERO),
            elapsed_time: params.elapsed_time(),
            dt: input.dt,
        }
    }

    /// Uniforms for a quiet step before the first frame runs.
    pub fn at_rest(params: &SimulationParams, resolution: u32) -> Self {
        Self::new(params, &StepInput::new(resolution, None, 0.0))
    }

    /// Workgroups per axis for an 8x8 compute dispatch.
    pub fn workgroups(&self) -> u32 {
        self.resolution.div_ceil(8)
    }
}

/// Surface material constants (matches WGSL `SurfaceUniform`).
#[derive(ShaderType, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceUniform {
    pub resolution: u32,
    /// `W / B`, scales height differences in the normal.
    pub field_scale: f32,
}

impl SurfaceUniform {
    pub fn new(grid: &GridConfig) -> Self {
        Self {
            resolution: grid.resolution(),
            field_scale: grid.world_to_field_scale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::water::UpdateRule;

    #[test]
    fn test_quiet_step_clears_active_flag() {
        let params = SimulationParams::default();
        let uniforms = FieldUniforms::at_rest(&params, 128);
        assert_eq!(uniforms.disturbance_active, 0);
        assert_eq!(uniforms.disturbance, Vec2::ZERO);
        assert_eq!(uniforms.resolution, 128);
    }

    #[test]
    fn test_disturbance_and_rule_are_packed() {
        let params = SimulationParams::default().with_rule(UpdateRule::Wave);
        let input = StepInput::new(64, Some(Vec2::new(0.0, 0.0)), 0.016);
        let uniforms = FieldUniforms::new(&params, &input);

        // A disturbance at the origin is still a disturbance.
        assert_eq!(uniforms.disturbance_active, 1);
        assert_eq!(uniforms.rule, 1);
        assert_eq!(uniforms.viscosity, params.viscosity());
        assert_eq!(uniforms.dt, 0.016);
    }

    #[test]
    fn test_workgroups_cover_the_grid() {
        let params = SimulationParams::default();
        assert_eq!(FieldUniforms::at_rest(&params, 128).workgroups(), 16);
        assert_eq!(FieldUniforms::at_rest(&params, 100).workgroups(), 13);
    }

    #[test]
    fn test_uniform_layout_size() {
        // Three u32, five f32, one vec2, two f32.
        assert_eq!(FieldUniforms::min_size().get(), 48);
    }

    #[test]
    fn test_surface_scale() {
        let grid = GridConfig::new(128, 512.0).unwrap();
        let surface = SurfaceUniform::new(&grid);
        assert_eq!(surface.field_scale, 0.25);
    }
}
