pub mod constants;
pub mod sets;
pub mod settings;
pub mod water;

pub use constants::*;
pub use settings::{SettingsError, WaterSettings};
