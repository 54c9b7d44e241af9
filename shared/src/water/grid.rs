//! Fixed simulation resolution and world-space footprint.
//!
//! Field space runs over `[0, W)` on both axes; cell `(i, j)` covers
//! `[i, i + 1) × [j, j + 1)` and its center sits at `(i + ½, j + ½)`.
//! World space is the XZ plane, with the surface centered on the origin
//! and spanning `B` units per side. Field `x` follows world `+X` and field
//! `y` follows world `+Z`.

use bevy::math::Vec2;
use thiserror::Error;

use crate::{FIELD_RESOLUTION, MAX_FIELD_RESOLUTION, WORLD_EXTENT};

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GridError {
    #[error("grid resolution must be at least 1 texel")]
    ZeroResolution,
    #[error("grid resolution {0} exceeds the maximum of {max}", max = MAX_FIELD_RESOLUTION)]
    ResolutionTooLarge(u32),
    #[error("world extent must be positive and finite, got {0}")]
    InvalidExtent(f32),
}

/// Simulation grid dimensions. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    resolution: u32,
    extent: f32,
}

impl GridConfig {
    pub fn new(resolution: u32, extent: f32) -> Result<Self, GridError> {
        if resolution == 0 {
            return Err(GridError::ZeroResolution);
        }
        if resolution > MAX_FIELD_RESOLUTION {
            return Err(GridError::ResolutionTooLarge(resolution));
        }
        if !extent.is_finite() || extent <= 0.0 {
            return Err(GridError::InvalidExtent(extent));
        }
        Ok(Self { resolution, extent })
    }

    /// Texels per side (`W`).
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// World units per side (`B`).
    #[inline]
    pub fn extent(&self) -> f32 {
        self.extent
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.resolution as usize * self.resolution as usize
    }

    /// Field cells per world unit (`W / B`).
    ///
    /// Also the factor applied to height differences when rebuilding normals,
    /// which keeps their slope independent of the grid resolution.
    #[inline]
    pub fn world_to_field_scale(&self) -> f32 {
        self.resolution as f32 / self.extent
    }

    /// Maps a planar world point `(x, z)`, relative to the surface center,
    /// into field space.
    pub fn world_to_field(&self, world: Vec2) -> Vec2 {
        (world + Vec2::splat(self.extent * 0.5)) * self.world_to_field_scale()
    }

    pub fn field_to_world(&self, field: Vec2) -> Vec2 {
        field / self.world_to_field_scale() - Vec2::splat(self.extent * 0.5)
    }

    pub fn contains_field(&self, field: Vec2) -> bool {
        let w = self.resolution as f32;
        (0.0..w).contains(&field.x) && (0.0..w).contains(&field.y)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: FIELD_RESOLUTION,
            extent: WORLD_EXTENT,
        }
    }
}

/// Field-space center of the cell at `(i, j)`.
#[inline]
pub fn cell_center(i: u32, j: u32) -> Vec2 {
    Vec2::new(i as f32 + 0.5, j as f32 + 0.5)
}

/// Wraps a possibly negative or overflowing coordinate onto `[0, n)`.
#[inline]
pub fn wrap_coord(coord: i64, n: u32) -> u32 {
    coord.rem_euclid(n as i64) as u32
}
