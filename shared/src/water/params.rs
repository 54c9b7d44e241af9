//! Live-tunable simulation parameters.
//!
//! Every setter validates before writing; a rejected value leaves the last
//! valid one in place and hands the caller a [`ParamError`] to surface.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    DEFAULT_DISTURBANCE_RADIUS, DEFAULT_DISTURBANCE_STRENGTH, DEFAULT_RELAXATION,
    DEFAULT_VISCOSITY,
};

/// Which recurrence the field update kernel applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpdateRule {
    /// Damped blend toward the neighbor average. Never increases field energy.
    #[default]
    Relaxation,
    /// Second-order ripple recurrence using the previous height kept in the
    /// auxiliary channel. Produces travelling waves.
    Wave,
}

impl UpdateRule {
    pub fn label(self) -> &'static str {
        match self {
            UpdateRule::Relaxation => "relaxation",
            UpdateRule::Wave => "wave",
        }
    }

    /// Index written into the GPU uniform.
    pub fn shader_index(self) -> u32 {
        match self {
            UpdateRule::Relaxation => 0,
            UpdateRule::Wave => 1,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ParamError {
    #[error("viscosity must lie strictly between 0 and 1 for the field to stay stable, got {0}")]
    ViscosityOutOfRange(f32),
    #[error("disturbance radius must be positive, got {0}")]
    InvalidRadius(f32),
    #[error("disturbance strength must be finite and non-negative, got {0}")]
    InvalidStrength(f32),
    #[error("relaxation must lie in (0, 1], got {0}")]
    RelaxationOutOfRange(f32),
    #[error("height compensation must be finite, got {0}")]
    NonFiniteCompensation(f32),
}

/// Parameters sampled once per simulation step.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    viscosity: f32,
    disturbance_radius: f32,
    disturbance_strength: f32,
    height_compensation: f32,
    relaxation: f32,
    rule: UpdateRule,
    elapsed_time: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            viscosity: DEFAULT_VISCOSITY,
            disturbance_radius: DEFAULT_DISTURBANCE_RADIUS,
            disturbance_strength: DEFAULT_DISTURBANCE_STRENGTH,
            height_compensation: 0.0,
            relaxation: DEFAULT_RELAXATION,
            rule: UpdateRule::default(),
            elapsed_time: 0.0,
        }
    }
}

impl SimulationParams {
    pub fn viscosity(&self) -> f32 {
        self.viscosity
    }

    /// Disturbance radius in field cells.
    pub fn disturbance_radius(&self) -> f32 {
        self.disturbance_radius
    }

    pub fn disturbance_strength(&self) -> f32 {
        self.disturbance_strength
    }

    pub fn height_compensation(&self) -> f32 {
        self.height_compensation
    }

    pub fn relaxation(&self) -> f32 {
        self.relaxation
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    /// Seconds of simulated time since startup.
    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Stability requires `0 < viscosity < 1`; anything else is rejected.
    pub fn set_viscosity(&mut self, viscosity: f32) -> Result<(), ParamError> {
        // Written so that NaN fails the check.
        if !(viscosity > 0.0 && viscosity < 1.0) {
            return Err(ParamError::ViscosityOutOfRange(viscosity));
        }
        self.viscosity = viscosity;
        Ok(())
    }

    pub fn set_disturbance_radius(&mut self, radius: f32) -> Result<(), ParamError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(ParamError::InvalidRadius(radius));
        }
        self.disturbance_radius = radius;
        Ok(())
    }

    pub fn set_disturbance_strength(&mut self, strength: f32) -> Result<(), ParamError> {
        if !(strength >= 0.0 && strength.is_finite()) {
            return Err(ParamError::InvalidStrength(strength));
        }
        self.disturbance_strength = strength;
        Ok(())
    }

    pub fn set_height_compensation(&mut self, compensation: f32) -> Result<(), ParamError> {
        if !compensation.is_finite() {
            return Err(ParamError::NonFiniteCompensation(compensation));
        }
        self.height_compensation = compensation;
        Ok(())
    }

    pub fn set_relaxation(&mut self, relaxation: f32) -> Result<(), ParamError> {
        if !(relaxation > 0.0 && relaxation <= 1.0) {
            return Err(ParamError::RelaxationOutOfRange(relaxation));
        }
        self.relaxation = relaxation;
        Ok(())
    }

    pub fn set_rule(&mut self, rule: UpdateRule) {
        self.rule = rule;
    }

    pub fn advance_time(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed_time += dt;
        }
    }

    /// Builder used by tests and settings: applies `viscosity` or fails.
    pub fn with_viscosity(mut self, viscosity: f32) -> Result<Self, ParamError> {
        self.set_viscosity(viscosity)?;
        Ok(self)
    }

    pub fn with_disturbance(mut self, radius: f32, strength: f32) -> Result<Self, ParamError> {
        self.set_disturbance_radius(radius)?;
        self.set_disturbance_strength(strength)?;
        Ok(self)
    }

    pub fn with_rule(mut self, rule: UpdateRule) -> Self {
        self.rule = rule;
        self
    }
}
