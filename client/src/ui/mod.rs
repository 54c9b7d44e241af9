pub mod tuning;

use bevy::prelude::*;
use shared::{sets::WaterUpdateSet, water::SimulationParams, WaterSettings};

use tuning::{tuning_panel, TuningPanel};

pub struct TuningUiPlugin;

impl Plugin for TuningUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TuningPanel>().add_systems(
            Update,
            tuning_panel
                .in_set(WaterUpdateSet::Ui)
                .run_if(resource_exists::<SimulationParams>)
                .run_if(resource_exists::<WaterSettings>),
        );
    }
}
