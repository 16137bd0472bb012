//! Photomosaic engine: recreates a picture as a grid of tile pictures
//!
//! Tiles are reduced to color metadata in parallel, assigned to grid cells by
//! a greedy heuristic that balances usage and keeps neighbours distinct, and
//! composited through a bounded surface cache.

#![forbid(unsafe_code)]

/// Tile assignment, caching, compositing and run orchestration
pub mod algorithm;
/// Source and tile pixel analysis
pub mod analysis;
/// Compact pixel storage and thumbnailing
pub mod codec;
/// Color spaces and perceptual distances
pub mod color;
/// Configuration, errors, progress, events and file I/O
pub mod io;

pub use io::error::{MosaicError, Result};
