//! WGSL sources for the water surface.
//!
//! ## Field update (`field_update.wgsl`)
//! Compute shader with two entry points over one bind group:
//! - `seed_field` copies the seed buffer into the write target
//! - `update_field` runs one kernel step from the read texture into the
//!   write texture
//!
//! The field texel format is chosen at startup; `FIELD_HALF` selects the
//! 16-bit storage declaration.
//!
//! ## Surface (`surface.wgsl`)
//! Vertex stage for the surface material: displaces each vertex by the
//! field height at its UV and rebuilds the normal from neighbor texels.
//! Fragment shading is the standard PBR path.

pub mod uniforms;

use bevy::{asset::embedded_asset, prelude::*};

/// Embedded shader asset paths
pub mod paths {
    pub const FIELD_UPDATE_SHADER: &str = "embedded://ripple/shaders/field_update.wgsl";
    pub const SURFACE_SHADER: &str = "embedded://ripple/shaders/surface.wgsl";
}

/// Compute entry points in `field_update.wgsl`.
pub mod entry_points {
    pub const SEED: &str = "seed_field";
    pub const UPDATE: &str = "update_field";
}

/// Shader def enabling the 16-bit field storage format.
pub const FIELD_HALF_DEF: &str = "FIELD_HALF";

pub struct ShadersPlugin;

impl Plugin for ShadersPlugin {
    fn build(&self, app: &mut App) {
        // Embed the shaders at compile time
        embedded_asset!(app, "field_update.wgsl");
        embedded_asset!(app, "surface.wgsl");
    }
}
