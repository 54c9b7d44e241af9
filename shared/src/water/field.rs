//! In-memory height field: the plain grid representation the update kernel
//! runs on outside of a GPU context, and the seed data uploaded to the GPU.

use super::grid::wrap_coord;
use super::store::StoreError;

/// One texel of the simulation state.
///
/// Mirrors the four-channel float texture layout used on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct FieldCell {
    /// Surface height.
    pub height: f32,
    /// Copy of `height` for the relaxation rule; previous height for the wave rule.
    pub auxiliary: f32,
    /// Unused padding channel.
    pub reserved0: f32,
    /// Unused padding channel.
    pub reserved1: f32,
}

impl FieldCell {
    /// Value written into the second reserved channel when seeding.
    pub const RESERVED_FILL: f32 = 1.0;

    /// A cell at rest at `height`, with `auxiliary` duplicating it.
    pub const fn at_rest(height: f32) -> Self {
        Self {
            height,
            auxiliary: height,
            reserved0: 0.0,
            reserved1: Self::RESERVED_FILL,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.height, self.auxiliary, self.reserved0, self.reserved1]
    }
}

/// A `W × W` grid of cells, stored row-major (`index = j * W + i`).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    resolution: u32,
    cells: Vec<FieldCell>,
}

impl FieldGrid {
    /// A flat field at height zero.
    pub fn new(resolution: u32) -> Self {
        let len = resolution as usize * resolution as usize;
        Self {
            resolution,
            cells: vec![FieldCell::at_rest(0.0); len],
        }
    }

    pub fn from_cells(resolution: u32, cells: Vec<FieldCell>) -> Result<Self, StoreError> {
        let expected = resolution as usize * resolution as usize;
        if cells.len() != expected {
            return Err(StoreError::ResolutionMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { resolution, cells })
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn cells(&self) -> &[FieldCell] {
        &self.cells
    }

    #[inline]
    pub fn index(&self, i: u32, j: u32) -> usize {
        debug_assert!(i < self.resolution && j < self.resolution);
        j as usize * self.resolution as usize + i as usize
    }

    #[inline]
    pub fn get(&self, i: u32, j: u32) -> FieldCell {
        self.cells[self.index(i, j)]
    }

    /// Reads a cell with toroidal wrap on both axes.
    #[inline]
    pub fn get_wrapped(&self, i: i64, j: i64) -> FieldCell {
        self.get(
            wrap_coord(i, self.resolution),
            wrap_coord(j, self.resolution),
        )
    }

    #[inline]
    pub fn set(&mut self, i: u32, j: u32, cell: FieldCell) {
        let index = self.index(i, j);
        self.cells[index] = cell;
    }

    #[inline]
    pub fn height(&self, i: u32, j: u32) -> f32 {
        self.get(i, j).height
    }

    /// Sum of squared heights, accumulated in f64 to keep long grids stable.
    pub fn energy(&self) -> f64 {
        self.cells
            .iter()
            .map(|cell| {
                let h = cell.height as f64;
                h * h
            })
            .sum()
    }

    pub fn max_abs_height(&self) -> f32 {
        self.cells
            .iter()
            .fold(0.0f32, |acc, cell| acc.max(cell.height.abs()))
    }

    /// Flattened RGBA texels in row-major order, ready for upload.
    pub fn texels(&self) -> Vec<[f32; 4]> {
        self.cells.iter().map(|cell| cell.to_array()).collect()
    }
}
