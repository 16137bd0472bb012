//! Boundary conversion of caller-supplied pixel data
//!
//! Callers hand the engine decoded pixels in whatever layout they hold. Every
//! variant is resolved once into an RGBA buffer; nothing past this point
//! deals with layouts.

use crate::io::error::{Result, invalid_parameter};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// Channel layout of a raw byte buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Four bytes per pixel: red, green, blue, alpha
    Rgba8,
    /// Three bytes per pixel: red, green, blue
    Rgb8,
    /// One byte per pixel: luminance
    Luma8,
}

impl PixelLayout {
    /// Bytes used by one pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
            Self::Luma8 => 1,
        }
    }
}

/// Decoded pixel data supplied by the caller
#[derive(Clone, Debug)]
pub enum PixelSource {
    /// RGBA buffer
    Rgba(RgbaImage),
    /// RGB buffer, treated as fully opaque
    Rgb(RgbImage),
    /// Grayscale buffer, treated as fully opaque
    Luma(GrayImage),
    /// Untyped bytes with explicit dimensions and layout
    Raw {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
        /// Channel layout of `data`
        layout: PixelLayout,
        /// Row-major pixel bytes
        data: Vec<u8>,
    },
}

impl PixelSource {
    /// Resolve into an RGBA buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the image has a zero dimension or a raw buffer's
    /// length does not match its dimensions and layout
    pub fn into_rgba(self) -> Result<RgbaImage> {
        let image = match self {
            Self::Rgba(image) => image,
            Self::Rgb(image) => DynamicImage::ImageRgb8(image).into_rgba8(),
            Self::Luma(image) => DynamicImage::ImageLuma8(image).into_rgba8(),
            Self::Raw {
                width,
                height,
                layout,
                data,
            } => from_raw(width, height, layout, data)?,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(invalid_parameter(
                "pixels",
                &format!("{}x{}", image.width(), image.height()),
                &"image has no pixels",
            ));
        }
        Ok(image)
    }
}

fn from_raw(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<RgbaImage> {
    let expected = width as usize * height as usize * layout.bytes_per_pixel();
    if data.len() != expected {
        return Err(invalid_parameter(
            "pixels",
            &format!("{} bytes", data.len()),
            &format!("{width}x{height} {layout:?} needs {expected} bytes"),
        ));
    }

    let mismatch = || invalid_parameter("pixels", &format!("{width}x{height}"), &"buffer mismatch");
    let image = match layout {
        PixelLayout::Rgba8 => RgbaImage::from_raw(width, height, data).ok_or_else(mismatch)?,
        PixelLayout::Rgb8 => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width, height, data).ok_or_else(mismatch)?,
        )
        .into_rgba8(),
        PixelLayout::Luma8 => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width, height, data).ok_or_else(mismatch)?,
        )
        .into_rgba8(),
    };
    Ok(image)
}
