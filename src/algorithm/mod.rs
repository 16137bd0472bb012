//! Assignment of tiles to grid cells and drawing of the result

/// Greedy cell-by-cell tile assignment
pub mod assignment;
/// Bounded LRU cache of rendered tile surfaces
pub mod cache;
/// Tile size planning and raster compositing
pub mod compositor;
/// Run orchestration and the background-thread wrapper
pub mod executor;
/// Slot-addressed tile pool
pub mod index;
/// Bitset of excluded tile slots
pub mod mask;
/// Placement grid and usage counts
pub mod placement;
/// Candidate ranking, usage restriction and tie-breaking
pub mod selection;
