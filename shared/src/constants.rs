/// Simulation texture width in texels; the field holds `FIELD_RESOLUTION²` cells.
pub const FIELD_RESOLUTION: u32 = 128;

/// Largest accepted field resolution; keeps `W²` mesh vertices addressable
/// by `u32` indices.
pub const MAX_FIELD_RESOLUTION: u32 = 16384;

/// Side length of the water surface in world units.
pub const WORLD_EXTENT: f32 = 512.0;

/// Per-step energy retention. Must stay strictly below 1.
pub const DEFAULT_VISCOSITY: f32 = 0.98;

/// Pointer disturbance radius in field cells (80 world units at 128 / 512).
pub const DEFAULT_DISTURBANCE_RADIUS: f32 = 20.0;

/// Height added at the center of a disturbance per step.
pub const DEFAULT_DISTURBANCE_STRENGTH: f32 = 0.5;

/// Blend factor toward the neighbor average used by the relaxation rule.
pub const DEFAULT_RELAXATION: f32 = 0.5;

/// Noise seed used when neither the settings file nor the CLI supplies one.
pub const DEFAULT_NOISE_SEED: u32 = 0;

/// Name of the RON settings file inside the config directory.
pub const SETTINGS_FILE_NAME: &str = "water.ron";
