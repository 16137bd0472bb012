//! Greedy row-major tile assignment
//!
//! Every cell picks its tile from the nearest candidates, balancing usage
//! across the pool and optionally refusing tiles already placed next to it.
//! Ties on usage are broken at random among the nearest few so that
//! equidistant tiles do not repeat in a visible pattern.

use crate::{
    algorithm::{
        mask::TileMask,
        placement::{PlacementMap, UsageCounter},
        selection::{
            Candidate, RandomSelector, max_usage, rank_candidates, restrict_by_usage,
            tie_break_pool,
        },
    },
    analysis::cells::SourceCell,
    color::distance::{ColorSample, DistanceMetric},
    io::configuration::{TIE_BREAK_FRACTION, TOP_CANDIDATES},
    io::error::{Result, engine_fault, invalid_parameter},
};

/// Parameters of the assignment heuristic
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssignmentOptions {
    /// Distance formula between cells and tiles
    pub metric: DistanceMetric,
    /// Whether orthogonal neighbours must differ
    pub neighbor_diversity: bool,
    /// Nearest candidates considered for the usage tie-break
    pub top_candidates: usize,
    /// Share of the minimum-usage subset eligible for the random pick
    pub tie_break_fraction: f64,
    /// Seed for the random pick
    pub seed: u64,
}

impl Default for AssignmentOptions {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Cie76,
            neighbor_diversity: true,
            top_candidates: TOP_CANDIDATES,
            tie_break_fraction: TIE_BREAK_FRACTION,
            seed: crate::io::configuration::DEFAULT_SEED,
        }
    }
}

/// Counters describing how constrained the assignment was
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AssignmentStats {
    /// Cells where the neighbour constraint excluded every tile and was dropped
    pub fallbacks: usize,
    /// Cells where every candidate had reached the usage ceiling
    pub saturated_cells: usize,
    /// Sum of the distances between cells and their chosen tiles
    pub total_distance: f64,
}

/// Output of a complete assignment
#[derive(Clone, Debug)]
pub struct Assignment {
    /// Slot placed at each grid position
    pub placements: PlacementMap,
    /// Placements per slot
    pub usage: UsageCounter,
    /// Constraint counters
    pub stats: AssignmentStats,
}

/// Sequential cell-by-cell tile picker
pub struct AssignmentEngine<'a> {
    tiles: &'a [ColorSample],
    options: AssignmentOptions,
    placements: PlacementMap,
    usage: UsageCounter,
    stats: AssignmentStats,
    ceiling: usize,
    excluded: TileMask,
    selector: RandomSelector,
    ranked: Vec<Candidate>,
    restricted: Vec<Candidate>,
}

impl<'a> AssignmentEngine<'a> {
    /// Prepare an assignment of `tiles` onto a `grid_size × grid_size` grid
    ///
    /// # Errors
    ///
    /// Returns an error if the tile pool is empty or the grid has no cells
    pub fn new(tiles: &'a [ColorSample], grid_size: u32, options: AssignmentOptions) -> Result<Self> {
        if tiles.is_empty() {
            return Err(invalid_parameter("tiles", &0, &"no usable tiles to assign"));
        }
        if grid_size == 0 {
            return Err(invalid_parameter("grid_size", &0, &"must be at least 1"));
        }

        let total_cells = grid_size as usize * grid_size as usize;
        Ok(Self {
            tiles,
            options,
            placements: PlacementMap::new(grid_size),
            usage: UsageCounter::new(tiles.len()),
            stats: AssignmentStats::default(),
            ceiling: max_usage(total_cells, tiles.len()),
            excluded: TileMask::new(tiles.len()),
            selector: RandomSelector::new(options.seed),
            ranked: Vec::with_capacity(tiles.len()),
            restricted: Vec::with_capacity(tiles.len()),
        })
    }

    /// Usage ceiling applied to every tile
    pub const fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Placements made so far
    pub const fn placements(&self) -> &PlacementMap {
        &self.placements
    }

    /// Usage so far
    pub const fn usage(&self) -> &UsageCounter {
        &self.usage
    }

    /// Counters so far
    pub const fn stats(&self) -> &AssignmentStats {
        &self.stats
    }

    /// Pick and record the tile for one cell
    ///
    /// Cells must be fed in row-major order for the neighbour constraint to
    /// see every already-placed neighbour.
    ///
    /// # Errors
    ///
    /// Returns an error if no candidate remains or the cell was already placed
    pub fn assign_cell(&mut self, cell: &SourceCell) -> Result<usize> {
        let (x, y) = (cell.x as usize, cell.y as usize);
        let sample = cell.sample();

        self.excluded.clear();
        if self.options.neighbor_diversity {
            for slot in self.placements.neighbors(x, y) {
                self.excluded.insert(slot);
            }
        }

        rank_candidates(
            &sample,
            self.tiles,
            &self.excluded,
            &self.usage,
            self.options.metric,
            &mut self.ranked,
        );

        if self.ranked.is_empty() && !self.excluded.is_empty() {
            self.stats.fallbacks += 1;
            tracing::trace!(x, y, "Neighbour constraint dropped for cell");
            self.excluded.clear();
            rank_candidates(
                &sample,
                self.tiles,
                &self.excluded,
                &self.usage,
                self.options.metric,
                &mut self.ranked,
            );
        }

        if restrict_by_usage(&self.ranked, self.ceiling, &mut self.restricted) {
            self.stats.saturated_cells += 1;
        }

        let pool = tie_break_pool(
            &self.restricted,
            self.options.top_candidates,
            self.options.tie_break_fraction,
        );
        let winner = *self.selector.pick(&pool).ok_or_else(|| {
            engine_fault(
                "assignment",
                &format!("no candidate tile for cell ({x}, {y})"),
            )
        })?;

        self.placements.place(x, y, winner.slot)?;
        self.usage.increment(winner.slot);
        self.stats.total_distance += winner.distance;
        Ok(winner.slot)
    }

    /// Assign every cell in order
    ///
    /// `on_cell` runs after each placement with the number of cells done and
    /// the placements so far; an error from it stops the assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell count does not match the grid, a cell
    /// cannot be assigned, or `on_cell` fails
    pub fn run<F>(mut self, cells: &[SourceCell], mut on_cell: F) -> Result<Assignment>
    where
        F: FnMut(usize, &PlacementMap) -> Result<()>,
    {
        let expected = self.placements.grid_size() * self.placements.grid_size();
        if cells.len() != expected {
            return Err(engine_fault(
                "assignment",
                &format!("{} source cells for a grid of {expected}", cells.len()),
            ));
        }

        for (done, cell) in cells.iter().enumerate() {
            self.assign_cell(cell)?;
            on_cell(done + 1, &self.placements)?;
        }

        tracing::debug!(
            fallbacks = self.stats.fallbacks,
            saturated = self.stats.saturated_cells,
            ceiling = self.ceiling,
            "Assignment finished"
        );

        Ok(Assignment {
            placements: self.placements,
            usage: self.usage,
            stats: self.stats,
        })
    }
}
