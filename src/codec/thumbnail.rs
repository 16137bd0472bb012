//! Downscaling helpers for tile thumbnails

use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Dimensions that fit `width × height` inside a square of `max_dimension`
///
/// Preserves aspect ratio, never upscales and never returns a zero side.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }

    let scale = f64::from(max_dimension) / f64::from(longest);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension);
    (scaled(width), scaled(height))
}

/// Aspect-preserving resize so the longer side is at most `max_dimension`
pub fn downscale(image: &RgbaImage, max_dimension: u32) -> RgbaImage {
    let (width, height) = fit_within(image.width(), image.height(), max_dimension);
    if (width, height) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Center-crop to a square and resize to `size × size`
pub fn square_thumbnail(image: &RgbaImage, size: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let cropped = imageops::crop_imm(image, (width - side) / 2, (height - side) / 2, side, side)
        .to_image();

    if side == size {
        return cropped;
    }
    imageops::resize(&cropped, size, size, FilterType::Triangle)
}
