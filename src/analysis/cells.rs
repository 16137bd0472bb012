//! Division of the source raster into grid cells

use crate::analysis::statistics::average_color;
use crate::color::distance::ColorSample;
use crate::color::lab::{Lab, LabConversion};
use crate::io::error::{Result, invalid_parameter};
use image::RgbaImage;

/// Average color of one grid position of the source raster
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceCell {
    /// Column in the grid
    pub x: u32,
    /// Row in the grid
    pub y: u32,
    /// Alpha-weighted mean color of the covered pixels
    pub rgb: [u8; 3],
    /// Lab representation of `rgb`
    pub lab: Lab,
}

impl SourceCell {
    /// Color of the cell as a matching sample
    pub const fn sample(&self) -> ColorSample {
        ColorSample {
            rgb: self.rgb,
            lab: self.lab,
        }
    }
}

/// Pixel span covered by grid index `index` along an axis of `length` pixels
///
/// Spans partition the axis; when the grid is finer than the raster every cell
/// still covers at least one pixel.
pub fn cell_span(index: u32, grid_size: u32, length: u32) -> (u32, u32) {
    let grid = u64::from(grid_size.max(1));
    let length_64 = u64::from(length);
    let start = (u64::from(index) * length_64 / grid) as u32;
    let end = ((u64::from(index) + 1) * length_64 / grid) as u32;
    (start, end.max(start + 1).min(length.max(1)))
}

/// Compute one [`SourceCell`] per grid position in row-major order
///
/// `on_row` runs after every completed grid row with the number of rows done;
/// returning an error stops the analysis.
///
/// # Errors
///
/// Returns an error if the grid size is zero or `on_row` fails
pub fn analyze_source<F>(
    image: &RgbaImage,
    grid_size: u32,
    conversion: LabConversion,
    mut on_row: F,
) -> Result<Vec<SourceCell>>
where
    F: FnMut(u32) -> Result<()>,
{
    if grid_size == 0 {
        return Err(invalid_parameter(
            "grid_size",
            &grid_size,
            &"must be at least 1",
        ));
    }

    let (width, height) = image.dimensions();
    let mut cells = Vec::with_capacity(grid_size as usize * grid_size as usize);
    let mut transparent_cells = 0usize;

    for y in 0..grid_size {
        let (y0, y1) = cell_span(y, grid_size, height);
        for x in 0..grid_size {
            let (x0, x1) = cell_span(x, grid_size, width);
            let pixels = (y0..y1).flat_map(|py| {
                (x0..x1).filter_map(move |px| image.get_pixel_checked(px, py).copied())
            });

            let rgb = average_color(pixels).unwrap_or_else(|| {
                transparent_cells += 1;
                [0, 0, 0]
            });

            cells.push(SourceCell {
                x,
                y,
                rgb,
                lab: conversion.convert(rgb),
            });
        }
        on_row(y + 1)?;
    }

    if transparent_cells > 0 {
        tracing::debug!(
            cells = transparent_cells,
            "Source cells without visible pixels treated as black"
        );
    }

    Ok(cells)
}
