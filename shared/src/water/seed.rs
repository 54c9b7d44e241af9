//! Procedural initial state: layered simplex noise over the grid.
//!
//! Runs once, before the first simulation step. The result is smooth and
//! undulating; nothing downstream depends on its exact shape.

use noise::{NoiseFn, Simplex};
use serde::{Deserialize, Serialize};

use super::field::{FieldCell, FieldGrid};
use super::grid::GridConfig;
use crate::DEFAULT_NOISE_SEED;

/// Parameters of the multi-octave noise sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Simplex permutation seed.
    pub seed: u32,
    /// Amplitude of the first octave.
    pub max_height: f32,
    pub octaves: u32,
    /// Frequency of the first octave, in noise units per coordinate unit.
    pub base_frequency: f32,
    /// Amplitude shrink ratio applied after the first octave.
    pub amplitude_ratio: f32,
    /// Added to `amplitude_ratio` for every later octave.
    pub amplitude_ratio_step: f32,
    /// Frequency growth ratio per octave.
    pub frequency_ratio: f32,
    /// Noise coordinate span covered by the whole grid, so the pattern keeps
    /// its shape at any resolution (`x = i · span / W`).
    pub coordinate_span: f32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_NOISE_SEED,
            max_height: 15.0,
            octaves: 15,
            base_frequency: 0.025,
            amplitude_ratio: 0.53,
            amplitude_ratio_step: 0.025,
            frequency_ratio: 1.25,
            coordinate_span: 128.0,
        }
    }
}

impl SeedConfig {
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }
}

/// Accumulates every octave of `noise` at `(x, y)`.
pub fn layered_noise(noise: &Simplex, x: f32, y: f32, config: &SeedConfig) -> f32 {
    let mut amplitude = config.max_height;
    let mut frequency = config.base_frequency;
    let mut sum = 0.0f32;

    for octave in 0..config.octaves {
        let sample = noise.get([(x * frequency) as f64, (y * frequency) as f64]) as f32;
        sum += amplitude * sample;
        amplitude *= config.amplitude_ratio + config.amplitude_ratio_step * octave as f32;
        frequency *= config.frequency_ratio;
    }

    sum
}

/// Builds the seed field for `grid`. Deterministic for a fixed config.
pub fn generate_field(grid: &GridConfig, config: &SeedConfig) -> FieldGrid {
    let resolution = grid.resolution();
    let noise = Simplex::new(config.seed);
    let scale = config.coordinate_span / resolution as f32;
    let mut field = FieldGrid::new(resolution);

    for j in 0..resolution {
        for i in 0..resolution {
            let height = layered_noise(&noise, i as f32 * scale, j as f32 * scale, config);
            field.set(i, j, FieldCell::at_rest(height));
        }
    }

    bevy_log::debug!(
        "Seeded {}x{} field (seed {}, max |h| = {:.2})",
        resolution,
        resolution,
        config.seed,
        field.max_abs_height()
    );

    field
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> GridConfig {
        GridConfig::new(32, 128.0).unwrap()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = SeedConfig::default().with_seed(7);
        let a = generate_field(&small_grid(), &config);
        let b = generate_field(&small_grid(), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_field(&small_grid(), &SeedConfig::default().with_seed(1));
        let b = generate_field(&small_grid(), &SeedConfig::default().with_seed(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_seed_channels() {
        let field = generate_field(&small_grid(), &SeedConfig::default());
        for cell in field.cells() {
            assert!(cell.height.is_finite());
            assert_eq!(cell.auxiliary, cell.height);
            assert_eq!(cell.reserved0, 0.0);
            assert_eq!(cell.reserved1, FieldCell::RESERVED_FILL);
        }
    }

    #[test]
    fn test_field_is_not_flat() {
        let field = generate_field(&small_grid(), &SeedConfig::default());
        assert!(field.max_abs_height() > 0.1);
    }

    #[test]
    fn test_neighbouring_cells_change_smoothly() {
        let field = generate_field(&GridConfig::default(), &SeedConfig::default());
        let resolution = field.resolution();
        // The first octave dominates, so adjacent cells stay within a few
        // units even though the total range spans tens of units.
        for j in 0..resolution {
            for i in 0..resolution - 1 {
                let step = (field.height(i + 1, j) - field.height(i, j)).abs();
                assert!(step < 10.0, "jump of {step} at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_zero_octaves_yield_flat_field() {
        let config = SeedConfig {
            octaves: 0,
            ..Default::default()
        };
        let field = generate_field(&small_grid(), &config);
        assert_eq!(field.max_abs_height(), 0.0);
    }
}
