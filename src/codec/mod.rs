//! Pixel buffer compression and resampling
//!
//! This module contains the storage side of tile handling:
//! - Lossy 16-bit RGB565 packing of thumbnails
//! - Aspect-preserving downscaling and square thumbnailing

/// RGB565 compression of RGBA buffers
pub mod rgb565;
/// Thumbnail and downscale helpers
pub mod thumbnail;

pub use rgb565::{CompressedPixels, compress, decompress};
