use crate::{
    algorithm::{mask::TileMask, placement::UsageCounter},
    color::distance::{ColorSample, DistanceMetric, distance},
    io::configuration::USAGE_SLACK_DIVISOR,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A tile slot scored against one grid cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Position in the tile index
    pub slot: usize,
    /// Color distance to the cell
    pub distance: f64,
    /// Placements of the slot so far
    pub usage: usize,
}

/// Usage ceiling for one tile
///
/// An even share of the cells plus slack that grows with the size of the
/// pool, so larger pools are allowed more uneven usage.
pub const fn max_usage(total_cells: usize, tile_count: usize) -> usize {
    if tile_count == 0 {
        return 0;
    }
    total_cells.div_ceil(tile_count) + tile_count.div_ceil(USAGE_SLACK_DIVISOR)
}

/// Score every non-excluded tile against `cell`, nearest first
///
/// The sort is stable so equal distances keep index order. `out` is cleared
/// before use.
pub fn rank_candidates(
    cell: &ColorSample,
    tiles: &[ColorSample],
    excluded: &TileMask,
    usage: &UsageCounter,
    metric: DistanceMetric,
    out: &mut Vec<Candidate>,
) {
    out.clear();
    out.extend(
        tiles
            .iter()
            .enumerate()
            .filter(|(slot, _)| !excluded.contains(*slot))
            .map(|(slot, tile)| Candidate {
                slot,
                distance: distance(cell, tile, metric),
                usage: usage.get(slot),
            }),
    );
    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Keep candidates below the usage ceiling
///
/// When every candidate has reached the ceiling, keeps the ones sharing the
/// lowest usage instead. Returns `true` in that saturated case.
pub fn restrict_by_usage(
    candidates: &[Candidate],
    ceiling: usize,
    out: &mut Vec<Candidate>,
) -> bool {
    out.clear();
    out.extend(candidates.iter().filter(|c| c.usage < ceiling).copied());
    if !out.is_empty() {
        return false;
    }

    if let Some(lowest) = candidates.iter().map(|c| c.usage).min() {
        out.extend(candidates.iter().filter(|c| c.usage == lowest).copied());
    }
    true
}

/// Narrow the nearest candidates down to the random-pick pool
///
/// From the first `top_n` candidates (already nearest first) keeps those with
/// the lowest usage. If several remain, only the nearest
/// `floor(len × fraction)` of them, at least one, stay eligible.
pub fn tie_break_pool(candidates: &[Candidate], top_n: usize, fraction: f64) -> Vec<Candidate> {
    let top = candidates.get(..top_n.min(candidates.len())).unwrap_or(&[]);
    let Some(lowest) = top.iter().map(|c| c.usage).min() else {
        return Vec::new();
    };

    let mut pool: Vec<Candidate> = top.iter().filter(|c| c.usage == lowest).copied().collect();
    if pool.len() > 1 {
        let keep = ((pool.len() as f64 * fraction).floor() as usize).max(1);
        pool.truncate(keep);
    }
    pool
}

/// Seeded random selector for reproducible tie-breaking
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Create a deterministic random selector
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform pick from `pool`; `None` only when the pool is empty
    pub fn pick<'a>(&mut self, pool: &'a [Candidate]) -> Option<&'a Candidate> {
        match pool.len() {
            0 => None,
            1 => pool.first(),
            len => pool.get(self.rng.random_range(0..len)),
        }
    }
}
