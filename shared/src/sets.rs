use bevy::prelude::*;

/// Per-frame ordering of the water systems: pointer samples are recorded
/// before the step consumes them, and the surface is updated after the swap.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum WaterUpdateSet {
    Input,
    Simulation,
    Rendering,
    Ui,
}
