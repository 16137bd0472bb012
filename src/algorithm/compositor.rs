//! Drawing placements into the result raster
//!
//! Surfaces are rendered once per tile and size through the tile cache. A tile
//! whose pixels cannot be used is painted as a flat fill of its average color,
//! and a cell with no known tile as a marker color, so one bad tile never
//! aborts a composite.

use crate::algorithm::cache::{CacheKey, SurfaceSource, TileCache};
use crate::algorithm::executor::MosaicResult;
use crate::algorithm::index::TileIndex;
use crate::algorithm::placement::PlacementMap;
use crate::analysis::extraction::TileRecord;
use crate::codec::rgb565::decompress;
use crate::io::configuration::{EngineConfig, MARKER_COLOR, MIN_EXPORT_TILE_SIZE, Quality};
use crate::io::error::{MosaicError, Result, engine_fault};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Final grid geometry of a composite
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridInfo {
    /// Cells along one side
    pub grid_size: u32,
    /// Tile side length actually used
    pub tile_size: u32,
    /// Tile side length that was asked for
    pub requested_tile_size: u32,
}

impl GridInfo {
    /// Whether the tile size was reduced to respect the raster limit
    pub const fn adjusted(&self) -> bool {
        self.tile_size != self.requested_tile_size
    }

    /// Side length of the composite raster in pixels
    pub const fn dimension(&self) -> u32 {
        self.grid_size * self.tile_size
    }
}

/// Fit the tile size so the raster stays within `limit` pixels per side
///
/// # Errors
///
/// Returns [`MosaicError::SizeLimitExceeded`] when even `minimum` is too large
pub fn plan_tile_size(grid_size: u32, requested: u32, limit: u32, minimum: u32) -> Result<GridInfo> {
    if grid_size == 0 || requested == 0 {
        return Err(engine_fault(
            "tile size planning",
            &format!("grid {grid_size} at tile size {requested}"),
        ));
    }

    let dimension = u64::from(grid_size) * u64::from(requested);
    if dimension <= u64::from(limit) {
        return Ok(GridInfo {
            grid_size,
            tile_size: requested,
            requested_tile_size: requested,
        });
    }

    let reduced = limit / grid_size;
    if reduced < minimum.max(1) {
        return Err(MosaicError::SizeLimitExceeded {
            grid_size,
            tile_size: minimum.max(1),
            dimension: u64::from(grid_size) * u64::from(minimum.max(1)),
            limit,
        });
    }

    tracing::info!(
        grid_size,
        requested,
        tile_size = reduced,
        limit,
        "Tile size reduced to fit raster limit"
    );
    Ok(GridInfo {
        grid_size,
        tile_size: reduced,
        requested_tile_size: requested,
    })
}

/// Solid square of one color
pub fn flat_surface(size: u32, rgb: [u8; 3]) -> RgbaImage {
    let [r, g, b] = rgb;
    RgbaImage::from_pixel(size, size, Rgba([r, g, b, u8::MAX]))
}

/// Renders tile surfaces at one size and places them on a raster
pub struct Compositor {
    tile_size: u32,
    filter: FilterType,
    source: SurfaceSource,
}

impl Compositor {
    /// Compositor drawing tiles at `tile_size` with the filter of `quality`
    pub const fn new(tile_size: u32, quality: Quality) -> Self {
        Self {
            tile_size,
            filter: quality.resize_filter(),
            source: SurfaceSource::for_quality(quality),
        }
    }

    /// Side length of rendered surfaces
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn source_pixels(&self, record: &TileRecord) -> Result<Arc<RgbaImage>> {
        let pixels = match self.source {
            SurfaceSource::Compressed => Arc::new(decompress(&record.compressed)?),
            SurfaceSource::Thumbnail => Arc::clone(&record.thumbnail),
        };

        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(engine_fault("render", &"tile pixels are empty"));
        }
        Ok(pixels)
    }

    /// Surface of `record` at this compositor's size, through the cache
    ///
    /// Falls back to a flat fill of the tile's average color when its pixels
    /// are unusable.
    pub fn render_surface(&self, record: &TileRecord, cache: &mut TileCache) -> Arc<RgbaImage> {
        let key = CacheKey::new(record.id, self.tile_size, self.source);
        if let Some(surface) = cache.get(&key) {
            return surface;
        }

        let surface = match self.source_pixels(record) {
            Ok(pixels) if pixels.dimensions() == (self.tile_size, self.tile_size) => pixels,
            Ok(pixels) => Arc::new(imageops::resize(
                pixels.as_ref(),
                self.tile_size,
                self.tile_size,
                self.filter,
            )),
            Err(error) => {
                tracing::warn!(
                    tile_id = %record.id,
                    filename = %record.filename,
                    %error,
                    "Tile pixels unusable, drawing average color"
                );
                Arc::new(flat_surface(self.tile_size, record.average.rgb))
            }
        };

        cache.insert(key, Arc::clone(&surface));
        surface
    }

    /// Surfaces of this size that fit in `cache` at once
    pub fn surface_budget(&self, cache: &TileCache) -> usize {
        let surface_bytes = self.tile_size as usize * self.tile_size as usize * 4;
        cache
            .max_entries()
            .min(cache.max_bytes() / surface_bytes.max(1))
    }

    /// Render records ahead of compositing so drawing mostly hits the cache
    ///
    /// Stops at [`Self::surface_budget`] surfaces. Returns the number
    /// rendered; `on_record` runs after each.
    pub fn prepare<'r, I, F>(&self, records: I, cache: &mut TileCache, mut on_record: F) -> usize
    where
        I: IntoIterator<Item = &'r TileRecord>,
        F: FnMut(usize),
    {
        let budget = self.surface_budget(cache);
        let mut rendered = 0;
        for record in records.into_iter().take(budget) {
            self.render_surface(record, cache);
            rendered += 1;
            on_record(rendered);
        }
        rendered
    }

    /// Draw one cell
    pub fn draw_cell(
        &self,
        raster: &mut RgbaImage,
        x: u32,
        y: u32,
        record: Option<&TileRecord>,
        cache: &mut TileCache,
    ) {
        let surface = match record {
            Some(record) => self.render_surface(record, cache),
            None => Arc::new(flat_surface(self.tile_size, MARKER_COLOR)),
        };
        imageops::replace(
            raster,
            surface.as_ref(),
            i64::from(x) * i64::from(self.tile_size),
            i64::from(y) * i64::from(self.tile_size),
        );
    }

    /// Draw a whole placement map
    ///
    /// `on_row` runs after every grid row with the number of rows drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if the map is incomplete or `on_row` fails
    pub fn composite<F>(
        &self,
        placements: &PlacementMap,
        index: &TileIndex,
        cache: &mut TileCache,
        mut on_row: F,
    ) -> Result<RgbaImage>
    where
        F: FnMut(usize) -> Result<()>,
    {
        if !placements.is_complete() {
            return Err(engine_fault(
                "composite",
                &format!(
                    "{} of {} cells placed",
                    placements.placed_count(),
                    placements.grid_size() * placements.grid_size()
                ),
            ));
        }

        let grid_size = placements.grid_size() as u32;
        let side = grid_size * self.tile_size;
        let mut raster = RgbaImage::new(side, side);

        for (x, y, slot) in placements.iter_row_major() {
            let record = slot.and_then(|slot| index.record(slot)).map(AsRef::as_ref);
            if record.is_none() {
                tracing::warn!(x, y, "Cell has no tile record, drawing marker");
            }
            self.draw_cell(&mut raster, x as u32, y as u32, record, cache);

            if x + 1 == placements.grid_size() {
                on_row(y + 1)?;
            }
        }

        Ok(raster)
    }
}

/// Low-resolution snapshot of an assignment in progress
///
/// One pixel per cell holding the placed tile's average color; unplaced cells
/// stay transparent.
pub fn preview_raster(placements: &PlacementMap, index: &TileIndex) -> RgbaImage {
    let side = placements.grid_size() as u32;
    let mut raster = RgbaImage::new(side, side);

    for (x, y, slot) in placements.iter_row_major() {
        let Some(record) = slot.and_then(|slot| index.record(slot)) else {
            continue;
        };
        if let Some(pixel) = raster.get_pixel_mut_checked(x as u32, y as u32) {
            let [r, g, b] = record.average.rgb;
            *pixel = Rgba([r, g, b, u8::MAX]);
        }
    }
    raster
}

/// Redraw a finished mosaic at a larger tile size
///
/// Works from the 64×64 buffers kept in each placement, so the original tile
/// inputs are not needed. The tile size is reduced toward
/// [`MIN_EXPORT_TILE_SIZE`] to stay within the raster limit.
///
/// # Errors
///
/// Returns [`MosaicError::SizeLimitExceeded`] when even the minimum tile size
/// does not fit
pub fn reconstruct_high_resolution(
    result: &MosaicResult,
    requested_tile_size: u32,
    config: &EngineConfig,
    quality: Quality,
) -> Result<(RgbaImage, GridInfo)> {
    let grid = plan_tile_size(
        result.grid.grid_size,
        requested_tile_size,
        config.raster_limit,
        MIN_EXPORT_TILE_SIZE,
    )?;

    let compositor = Compositor::new(grid.tile_size, quality);
    let mut cache = TileCache::new(config.cache_max_entries, config.cache_max_bytes);
    let mut raster = RgbaImage::new(grid.dimension(), grid.dimension());

    for placement in &result.placements {
        compositor.draw_cell(
            &mut raster,
            placement.x,
            placement.y,
            Some(placement.tile.as_ref()),
            &mut cache,
        );
    }

    tracing::info!(
        grid_size = grid.grid_size,
        tile_size = grid.tile_size,
        "High-resolution mosaic rebuilt"
    );
    Ok((raster, grid))
}
