//! Lossy 16-bit pixel packing
//!
//! Each pixel keeps 5 bits of red, 6 of green and 5 of blue. Alpha is dropped
//! and restored as fully opaque, halving the footprint of an RGBA buffer.

use crate::io::error::{Result, engine_fault};
use image::{Rgba, RgbaImage};

/// RGB565 encoded pixel buffer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedPixels {
    width: u32,
    height: u32,
    data: Vec<u16>,
}

impl CompressedPixels {
    /// Wrap an existing payload without validating its length
    ///
    /// Mismatched payloads are reported by [`decompress`].
    pub const fn from_raw(width: u32, height: u32, data: Vec<u16>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Packed pixels in row-major order
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Bytes held by the packed payload
    pub fn byte_len(&self) -> usize {
        self.data.len() * std::mem::size_of::<u16>()
    }
}

/// Pack one pixel into 5-6-5 bits
pub const fn pack(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Expand a packed pixel back to 8-bit channels by bit replication
pub const fn unpack(value: u16) -> [u8; 3] {
    let r5 = ((value >> 11) & 0x1f) as u8;
    let g6 = ((value >> 5) & 0x3f) as u8;
    let b5 = (value & 0x1f) as u8;
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2)]
}

/// Quantize an RGBA buffer to RGB565
pub fn compress(image: &RgbaImage) -> CompressedPixels {
    let data = image
        .pixels()
        .map(|Rgba([r, g, b, _])| pack(*r, *g, *b))
        .collect();

    CompressedPixels {
        width: image.width(),
        height: image.height(),
        data,
    }
}

/// Expand an RGB565 buffer to opaque RGBA
///
/// # Errors
///
/// Returns an error if the payload length does not match the stored dimensions
pub fn decompress(compressed: &CompressedPixels) -> Result<RgbaImage> {
    let expected = compressed.width as usize * compressed.height as usize;
    if compressed.data.len() != expected {
        return Err(engine_fault(
            "decompress",
            &format!(
                "payload holds {} pixels, expected {expected} for {}x{}",
                compressed.data.len(),
                compressed.width,
                compressed.height
            ),
        ));
    }

    let raw: Vec<u8> = compressed
        .data
        .iter()
        .flat_map(|&value| {
            let [r, g, b] = unpack(value);
            [r, g, b, u8::MAX]
        })
        .collect();

    RgbaImage::from_raw(compressed.width, compressed.height, raw)
        .ok_or_else(|| engine_fault("decompress", &"buffer size mismatch"))
}
