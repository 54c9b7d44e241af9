//! Per-cell field update.
//!
//! The kernel is a pure function of one cell, its four axis neighbors and
//! the step parameters, so the same code runs over an in-memory grid here
//! and is mirrored one-to-one by `field_update.wgsl` on the GPU.
//!
//! ## Edge policy
//! The field is a torus. Neighbor reads past `0` or `W - 1` wrap to the
//! opposite edge, and disturbance distances use the minimum-image distance,
//! so a disturbance at `(0, 0)` reaches cells at `(W - 1, *)` and `(*, W - 1)`
//! exactly as it reaches `(1, *)` and `(*, 1)`.

use bevy::math::Vec2;
use std::f32::consts::PI;

use super::field::{FieldCell, FieldGrid};
use super::grid::cell_center;
use super::params::{SimulationParams, UpdateRule};

/// Disturbance point in field space for one step, or `None` when the
/// pointer did not move onto the surface this frame.
pub type Disturbance = Option<Vec2>;

/// Per-step inputs that are not tunable parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    pub disturbance: Disturbance,
    /// Grid width `W`, needed for wrapped distances.
    pub resolution: u32,
    /// Frame delta in seconds. Both rules are fixed-step recurrences and
    /// ignore it; it is forwarded for shaders that animate over time.
    pub dt: f32,
}

impl StepInput {
    pub fn new(resolution: u32, disturbance: Disturbance, dt: f32) -> Self {
        Self {
            disturbance,
            resolution,
            dt,
        }
    }
}

/// The four axis-aligned neighbors of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbors {
    /// `(i, j + 1)`
    pub north: FieldCell,
    /// `(i, j - 1)`
    pub south: FieldCell,
    /// `(i + 1, j)`
    pub east: FieldCell,
    /// `(i - 1, j)`
    pub west: FieldCell,
}

impl Neighbors {
    /// Gathers the neighbors of `(i, j)` with wrap-around.
    pub fn gather(field: &FieldGrid, i: u32, j: u32) -> Self {
        let (i, j) = (i as i64, j as i64);
        Self {
            north: field.get_wrapped(i, j + 1),
            south: field.get_wrapped(i, j - 1),
            east: field.get_wrapped(i + 1, j),
            west: field.get_wrapped(i - 1, j),
        }
    }

    #[inline]
    pub fn height_sum(&self) -> f32 {
        self.north.height + self.south.height + self.east.height + self.west.height
    }

    #[inline]
    pub fn average_height(&self) -> f32 {
        self.height_sum() * 0.25
    }
}

/// Minimum-image distance between two field points on a `W × W` torus.
pub fn toroidal_distance(a: Vec2, b: Vec2, resolution: u32) -> f32 {
    let w = resolution as f32;
    let wrap = |d: f32| {
        let d = d.abs() % w;
        d.min(w - d)
    };
    Vec2::new(wrap(a.x - b.x), wrap(a.y - b.y)).length()
}

/// Height added at `position` by this step's disturbance.
///
/// Raised-cosine falloff: full strength at the center, zero at and beyond
/// the radius, with no hard edge.
pub fn disturbance_impulse(
    position: Vec2,
    params: &SimulationParams,
    input: &StepInput,
) -> f32 {
    let Some(center) = input.disturbance else {
        return 0.0;
    };
    let radius = params.disturbance_radius();
    let distance = toroidal_distance(position, center, input.resolution);
    if distance >= radius {
        return 0.0;
    }
    let phase = distance * PI / radius;
    params.disturbance_strength() * 0.5 * (1.0 + phase.cos())
}

/// A data-parallel update rule over one cell and its bounded neighborhood.
pub trait FieldKernel {
    /// Computes the next state of the cell centered at `position`.
    fn update(
        &self,
        cell: FieldCell,
        neighbors: &Neighbors,
        position: Vec2,
        params: &SimulationParams,
        input: &StepInput,
    ) -> FieldCell;
}

/// Damped blend of each height toward its neighbor average.
///
/// `h' = viscosity · (h + relaxation · (avg − h))`. The blend operator has
/// spectral radius at most one on the torus and viscosity scales it below
/// one, so without disturbance or compensation the sum of squared heights
/// never grows.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelaxationKernel;

impl FieldKernel for RelaxationKernel {
    fn update(
        &self,
        cell: FieldCell,
        neighbors: &Neighbors,
        position: Vec2,
        params: &SimulationParams,
        input: &StepInput,
    ) -> FieldCell {
        let average = neighbors.average_height();
        let blended = cell.height + params.relaxation() * (average - cell.height);
        let height = blended * params.viscosity()
            + disturbance_impulse(position, params, input)
            + params.height_compensation();

        FieldCell {
            height,
            auxiliary: height,
            ..cell
        }
    }
}

/// Second-order ripple recurrence.
///
/// `h' = (½ · (N + S + E + W) − h_prev) · viscosity`, where `h_prev` lives in
/// the auxiliary channel. The old height moves into the auxiliary channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveKernel;

impl FieldKernel for WaveKernel {
    fn update(
        &self,
        cell: FieldCell,
        neighbors: &Neighbors,
        position: Vec2,
        params: &SimulationParams,
        input: &StepInput,
    ) -> FieldCell {
        let propagated = neighbors.height_sum() * 0.5 - cell.auxiliary;
        let height = propagated * params.viscosity()
            + disturbance_impulse(position, params, input)
            + params.height_compensation();

        FieldCell {
            height,
            auxiliary: cell.height,
            ..cell
        }
    }
}

impl FieldKernel for UpdateRule {
    fn update(
        &self,
        cell: FieldCell,
        neighbors: &Neighbors,
        position: Vec2,
        params: &SimulationParams,
        input: &StepInput,
    ) -> FieldCell {
        match self {
            UpdateRule::Relaxation => RelaxationKernel.update(cell, neighbors, position, params, input),
            UpdateRule::Wave => WaveKernel.update(cell, neighbors, position, params, input),
        }
    }
}

/// Runs `kernel` over every cell of `source`, writing into `target`.
///
/// `source` and `target` are distinct borrows, so a step can never read
/// cells it has already overwritten.
pub fn apply_kernel<K: FieldKernel + ?Sized>(
    kernel: &K,
    source: &FieldGrid,
    target: &mut FieldGrid,
    params: &SimulationParams,
    input: &StepInput,
) {
    debug_assert_eq!(source.resolution(), target.resolution());
    let resolution = source.resolution();

    for j in 0..resolution {
        for i in 0..resolution {
            let neighbors = Neighbors::gather(source, i, j);
            let position = cell_center(i, j);
            let next = kernel.update(source.get(i, j), &neighbors, position, params, input);
            target.set(i, j, next);
        }
    }
}
