//! Grid placement bookkeeping for one assignment run

use crate::io::error::{Result, engine_fault};
use ndarray::Array2;

/// Tile slot placed at each grid position
///
/// Indexed as `(row, column)`. Cells are written once and never cleared.
#[derive(Debug, Clone)]
pub struct PlacementMap {
    cells: Array2<Option<usize>>,
    placed: usize,
}

impl PlacementMap {
    /// Create an empty square map
    pub fn new(grid_size: u32) -> Self {
        let side = grid_size as usize;
        Self {
            cells: Array2::from_elem((side, side), None),
            placed: 0,
        }
    }

    /// Cells along one side
    pub fn grid_size(&self) -> usize {
        self.cells.nrows()
    }

    /// Slot placed at `(x, y)`, if any
    pub fn get(&self, x: usize, y: usize) -> Option<usize> {
        self.cells.get((y, x)).copied().flatten()
    }

    /// Record `slot` at `(x, y)`
    ///
    /// # Errors
    ///
    /// Returns an error if the position is outside the grid or already taken
    pub fn place(&mut self, x: usize, y: usize, slot: usize) -> Result<()> {
        let cell = self.cells.get_mut((y, x)).ok_or_else(|| {
            engine_fault("placement", &format!("cell ({x}, {y}) is outside the grid"))
        })?;
        if cell.is_some() {
            return Err(engine_fault(
                "placement",
                &format!("cell ({x}, {y}) was already placed"),
            ));
        }
        *cell = Some(slot);
        self.placed += 1;
        Ok(())
    }

    /// Slots placed at the left, right, upper and lower neighbours of `(x, y)`
    pub fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = usize> + '_ {
        let left = x.checked_sub(1).map(|nx| (nx, y));
        let up = y.checked_sub(1).map(|ny| (x, ny));
        let right = Some((x + 1, y));
        let down = Some((x, y + 1));

        [left, right, up, down]
            .into_iter()
            .flatten()
            .filter_map(move |(nx, ny)| self.get(nx, ny))
    }

    /// Number of placed cells
    pub const fn placed_count(&self) -> usize {
        self.placed
    }

    /// Whether every cell holds a slot
    pub fn is_complete(&self) -> bool {
        self.placed == self.cells.len()
    }

    /// Every cell as `(x, y, slot)` in row-major order
    pub fn iter_row_major(&self) -> impl Iterator<Item = (usize, usize, Option<usize>)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((y, x), slot)| (x, y, *slot))
    }
}

/// Number of placements per tile slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageCounter {
    counts: Vec<usize>,
}

impl UsageCounter {
    /// Zeroed counter for `slot_count` tiles
    pub fn new(slot_count: usize) -> Self {
        Self {
            counts: vec![0; slot_count],
        }
    }

    /// Placements of `slot` so far
    pub fn get(&self, slot: usize) -> usize {
        self.counts.get(slot).copied().unwrap_or(0)
    }

    /// Count one more placement of `slot`
    pub fn increment(&mut self, slot: usize) {
        if let Some(count) = self.counts.get_mut(slot) {
            *count += 1;
        }
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Counts indexed by slot
    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }
}
