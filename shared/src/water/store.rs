//! Double-buffered field storage.
//!
//! [`PingPong`] owns both buffer slots and the flag selecting which one is
//! current; nothing else can alias them. The same type backs the in-memory
//! [`FieldStore`] and the GPU texture pair in the client.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::field::FieldGrid;
use super::grid::GridConfig;
use super::kernel::{apply_kernel, FieldKernel, StepInput};
use super::params::SimulationParams;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("no supported field texture format (tried {tried:?})")]
    UnsupportedFormat { tried: Vec<FieldFormat> },
    #[error("field holds {actual} cells but the grid needs {expected}")]
    ResolutionMismatch { expected: usize, actual: usize },
    #[error("field resolution {requested} exceeds the device texture limit of {max}")]
    ResolutionTooLarge { requested: u32, max: u32 },
}

/// Identifies one of the two buffer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// Two owned buffers plus the flag naming the current one.
///
/// `current` is the buffer most recently finished writing and is safe to
/// read; `scratch` is the one the next step overwrites.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: Slot,
}

impl<T> PingPong<T> {
    /// Starts with `a` current and `b` as scratch.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            current: Slot::A,
        }
    }

    #[inline]
    pub fn current(&self) -> &T {
        &self.slots[self.current.index()]
    }

    #[inline]
    pub fn scratch(&self) -> &T {
        &self.slots[self.current.other().index()]
    }

    #[inline]
    pub fn current_slot(&self) -> Slot {
        self.current
    }

    #[inline]
    pub fn scratch_slot(&self) -> Slot {
        self.current.other()
    }

    #[inline]
    pub fn get(&self, slot: Slot) -> &T {
        &self.slots[slot.index()]
    }

    /// Read access to current and write access to scratch, for one step.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        match self.current {
            Slot::A => (&*a, b),
            Slot::B => (&*b, a),
        }
    }

    /// Promotes scratch to current. Swaps roles, never contents.
    #[inline]
    pub fn swap(&mut self) {
        self.current = self.current.other();
    }
}

/// Texel formats the field textures can be allocated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldFormat {
    /// Four 32-bit float channels.
    Rgba32Float,
    /// Four 16-bit float channels. Lower precision fallback.
    Rgba16Float,
}

impl FieldFormat {
    pub const PREFERRED: FieldFormat = FieldFormat::Rgba32Float;

    pub fn fallback(self) -> Option<FieldFormat> {
        match self {
            FieldFormat::Rgba32Float => Some(FieldFormat::Rgba16Float),
            FieldFormat::Rgba16Float => None,
        }
    }

    pub fn bytes_per_texel(self) -> usize {
        match self {
            FieldFormat::Rgba32Float => 16,
            FieldFormat::Rgba16Float => 8,
        }
    }
}

/// Picks `requested` if `supported` accepts it, otherwise retries once with
/// its fallback.
pub fn negotiate_format(
    requested: FieldFormat,
    supported: impl Fn(FieldFormat) -> bool,
) -> Result<FieldFormat, StoreError> {
    let mut tried = vec![requested];
    if supported(requested) {
        return Ok(requested);
    }
    if let Some(fallback) = requested.fallback() {
        tried.push(fallback);
        if supported(fallback) {
            bevy_log::warn!(
                "Field format {:?} unsupported, falling back to {:?}",
                requested,
                fallback
            );
            return Ok(fallback);
        }
    }
    Err(StoreError::UnsupportedFormat { tried })
}

/// Fails if a `resolution²` texture exceeds the device's `max` dimension.
pub fn check_texture_resolution(resolution: u32, max: u32) -> Result<(), StoreError> {
    if resolution > max {
        return Err(StoreError::ResolutionTooLarge {
            requested: resolution,
            max,
        });
    }
    Ok(())
}

/// In-memory ping-pong store: the CPU backend and the test harness for the
/// kernel.
#[derive(Resource, Debug, Clone)]
pub struct FieldStore {
    grid: GridConfig,
    buffers: PingPong<FieldGrid>,
    steps: u64,
}

impl FieldStore {
    /// Both slots start as copies of `initial`.
    pub fn new(grid: GridConfig, initial: FieldGrid) -> Result<Self, StoreError> {
        if initial.resolution() != grid.resolution() {
            return Err(StoreError::ResolutionMismatch {
                expected: grid.cell_count(),
                actual: initial.cells().len(),
            });
        }
        Ok(Self {
            grid,
            buffers: PingPong::new(initial.clone(), initial),
            steps: 0,
        })
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// The most recently written field.
    pub fn current_field(&self) -> &FieldGrid {
        self.buffers.current()
    }

    pub fn buffers(&self) -> &PingPong<FieldGrid> {
        &self.buffers
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Reads current, writes scratch through `kernel`, then swaps.
    pub fn step<K: FieldKernel + ?Sized>(
        &mut self,
        kernel: &K,
        params: &SimulationParams,
        input: &StepInput,
    ) {
        let (source, target) = self.buffers.split();
        apply_kernel(kernel, source, target, params, input);
        self.buffers.swap();
        self.steps += 1;
    }
}
