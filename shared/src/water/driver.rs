//! Per-frame orchestration: mapper output, one kernel step, swap.
//!
//! The hand-off of the fresh buffer to the displacement stage is the
//! stepper's business. The in-memory store exposes it through
//! [`FieldStore::current_field`]; the GPU stepper in the client rebinds the
//! surface material after its swap.

use super::interaction::PendingDisturbance;
use super::kernel::{Disturbance, StepInput};
use super::params::SimulationParams;
use super::store::FieldStore;

/// Something that can advance the field by exactly one step.
pub trait FieldStepper {
    fn resolution(&self) -> u32;

    /// Runs one update with `input` and promotes the written buffer.
    fn step(&mut self, params: &SimulationParams, input: &StepInput);
}

impl FieldStepper for FieldStore {
    fn resolution(&self) -> u32 {
        self.grid().resolution()
    }

    fn step(&mut self, params: &SimulationParams, input: &StepInput) {
        let rule = params.rule();
        FieldStore::step(self, &rule, params, input);
    }
}

/// Runs one frame: advances time, consumes the pending disturbance and
/// steps once. Returns the disturbance that was applied.
pub fn drive_frame<S: FieldStepper + ?Sized>(
    stepper: &mut S,
    params: &mut SimulationParams,
    pending: &mut PendingDisturbance,
    dt: f32,
) -> Disturbance {
    params.advance_time(dt);
    let disturbance = pending.take();
    let input = StepInput::new(stepper.resolution(), disturbance, dt);
    stepper.step(params, &input);
    disturbance
}
