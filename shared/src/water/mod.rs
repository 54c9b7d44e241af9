//! Height-field water simulation core.
//!
//! ## Architecture
//!
//! ```text
//!   pointer ──► interaction ──► PendingDisturbance
//!                                     │ take()
//!                                     ▼
//!   seed ──► store (PingPong<FieldGrid>) ──► kernel ──► swap
//!                                     │ current
//!                                     ▼
//!                               displacement ──► mesh heights + normals
//! ```
//!
//! Everything here is engine-neutral apart from the `Resource` derives, so
//! the same kernel, mapper and displacement code back the GPU pipeline in
//! the client (as WGSL mirrors) and run directly as the CPU backend.

pub mod displacement;
pub mod driver;
pub mod field;
pub mod grid;
pub mod interaction;
pub mod kernel;
pub mod params;
pub mod seed;
pub mod store;

pub use displacement::{displace, surface_normal, SurfaceMesh, SurfaceSample};
pub use driver::{drive_frame, FieldStepper};
pub use field::{FieldCell, FieldGrid};
pub use grid::{GridConfig, GridError};
pub use interaction::{map_pointer, CameraView, MapFailure, PendingDisturbance, ProxySurface};
pub use kernel::{Disturbance, FieldKernel, RelaxationKernel, StepInput, WaveKernel};
pub use params::{ParamError, SimulationParams, UpdateRule};
pub use seed::{generate_field, SeedConfig};
pub use store::{
    check_texture_resolution, negotiate_format, FieldFormat, FieldStore, PingPong, Slot, StoreError,
};
