//! Pixel analysis for tiles and the source picture

/// Source raster to grid cells
pub mod cells;
/// Per-tile metadata extraction on a worker pool
pub mod extraction;
/// Tagged pixel inputs
pub mod pixels;
/// Average and dominant colors
pub mod statistics;
