//! Engine constants and runtime configuration defaults

use crate::color::lab::LabConversion;
use crate::io::error::{Result, invalid_parameter};
use image::imageops::FilterType;

// Tile metadata extraction
/// Side length of the fixed square thumbnail kept for every tile
pub const THUMBNAIL_SIZE: u32 = 64;
/// Number of tiles processed per memory-control batch
pub const DEFAULT_BATCH_SIZE: usize = 24;
/// Upper bound on concurrent extraction workers
pub const MAX_CONCURRENCY: usize = 12;
/// Maximum number of dominant colors recorded per tile
pub const DOMINANT_COLOR_COUNT: usize = 3;
/// Channel width of the coarse buckets used for dominant colors
pub const DOMINANT_BUCKET_SIZE: u8 = 32;

// Assignment heuristic
/// Number of nearest candidates kept before usage tie-breaking
pub const TOP_CANDIDATES: usize = 10;
/// Share of the minimum-usage subset eligible for the random pick
pub const TIE_BREAK_FRACTION: f64 = 0.35;
/// Pool size per extra unit of usage slack
pub const USAGE_SLACK_DIVISOR: usize = 20;

// Empirically tuned, approximates luminance sensitivity
/// Per-channel weights (R, G, B) of the squared RGB distance
pub const RGB_DISTANCE_WEIGHTS: [f64; 3] = [2.0, 4.0, 3.0];

// Tile cache budget
/// Default maximum number of cached surfaces
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;
/// Default maximum estimated byte size of cached surfaces
pub const DEFAULT_CACHE_MAX_BYTES: usize = 64 * 1024 * 1024;

// Compositing limits
/// Largest raster side length most platforms can allocate
pub const RASTER_DIMENSION_LIMIT: u32 = 32_767;
/// Smallest tile size accepted for high-resolution reconstruction
pub const MIN_EXPORT_TILE_SIZE: u32 = 16;
/// Fill used when a placement has no usable pixels and no known color
pub const MARKER_COLOR: [u8; 3] = [255, 0, 255];

// Default values for configurable parameters
/// Default number of cells along one side of the grid
pub const DEFAULT_GRID_SIZE: u32 = 50;
/// Default rendered tile side length in pixels
pub const DEFAULT_TILE_SIZE: u32 = 32;
/// Fixed seed for reproducible tie-breaking
pub const DEFAULT_SEED: u64 = 42;
/// Number of preview frames emitted during assignment
pub const DEFAULT_PREVIEW_FRAMES: usize = 20;

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";
/// Suffix added to high-resolution export filenames
pub const HIRES_SUFFIX: &str = "_hires";

/// Rendering quality trade-off
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Quality {
    /// Fast Lab approximation, nearest-neighbour scaling
    Low,
    /// Precise Lab with Euclidean distance, triangle filtering
    #[default]
    Medium,
    /// Delta-E 2000, Lanczos filtering and uncompressed tiles
    High,
}

impl Quality {
    /// Lab conversion used for tiles and source cells
    pub const fn lab_conversion(self) -> LabConversion {
        match self {
            Self::Low => LabConversion::Fast,
            Self::Medium | Self::High => LabConversion::Precise,
        }
    }

    /// Resampling filter used when rendering tile surfaces
    pub const fn resize_filter(self) -> FilterType {
        match self {
            Self::Low => FilterType::Nearest,
            Self::Medium => FilterType::Triangle,
            Self::High => FilterType::Lanczos3,
        }
    }

    /// Whether surfaces are rendered from the RGB565 payload instead of the thumbnail
    pub const fn uses_compressed_tiles(self) -> bool {
        !matches!(self, Self::High)
    }
}

/// Color space used to compare source cells with tiles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ColorMatching {
    /// Weighted RGB distance, favours speed
    Rgb,
    /// Perceptual Lab distance
    #[default]
    Lab,
}

/// User-facing generation settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MosaicSettings {
    /// Number of cells along one side of the square grid
    pub grid_size: u32,
    /// Requested side length of each rendered tile in pixels
    pub tile_size: u32,
    /// Rendering quality trade-off
    pub quality: Quality,
    /// Distance space for matching
    pub color_matching: ColorMatching,
    /// Whether orthogonal neighbours must differ
    pub neighbor_diversity: bool,
}

impl Default for MosaicSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            quality: Quality::default(),
            color_matching: ColorMatching::default(),
            neighbor_diversity: true,
        }
    }
}

impl MosaicSettings {
    /// Total number of grid cells
    pub const fn cell_count(&self) -> usize {
        (self.grid_size as usize) * (self.grid_size as usize)
    }

    /// Check settings against the raster limit of `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the grid or tile size is zero, or if the grid alone
    /// exceeds the raster dimension limit
    pub fn validate(&self, config: &EngineConfig) -> Result<()> {
        if self.grid_size == 0 {
            return Err(invalid_parameter(
                "grid_size",
                &self.grid_size,
                &"must be at least 1",
            ));
        }
        if self.tile_size == 0 {
            return Err(invalid_parameter(
                "tile_size",
                &self.tile_size,
                &"must be at least 1",
            ));
        }
        if self.grid_size > config.raster_limit {
            return Err(invalid_parameter(
                "grid_size",
                &self.grid_size,
                &format!("exceeds the raster limit of {}px", config.raster_limit),
            ));
        }
        Ok(())
    }
}

/// Engine tuning knobs that are not exposed as user settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Tiles per extraction batch
    pub batch_size: usize,
    /// Extraction worker threads
    pub concurrency: usize,
    /// Maximum number of cached surfaces
    pub cache_max_entries: usize,
    /// Maximum estimated byte size of cached surfaces
    pub cache_max_bytes: usize,
    /// Largest raster side length in pixels
    pub raster_limit: u32,
    /// Seed for the tie-breaking random generator
    pub seed: u64,
    /// Nearest candidates kept before usage tie-breaking
    pub top_candidates: usize,
    /// Share of the minimum-usage subset eligible for the random pick
    pub tie_break_fraction: f64,
    /// Number of preview frames emitted during assignment (0 disables previews)
    pub preview_frames: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: default_concurrency(),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_max_bytes: DEFAULT_CACHE_MAX_BYTES,
            raster_limit: RASTER_DIMENSION_LIMIT,
            seed: DEFAULT_SEED,
            top_candidates: TOP_CANDIDATES,
            tie_break_fraction: TIE_BREAK_FRACTION,
            preview_frames: DEFAULT_PREVIEW_FRAMES,
        }
    }
}

impl EngineConfig {
    /// Check tuning values for consistency
    ///
    /// # Errors
    ///
    /// Returns an error if a size, count or fraction is out of range
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(invalid_parameter(
                "batch_size",
                &self.batch_size,
                &"must be at least 1",
            ));
        }
        if self.concurrency == 0 {
            return Err(invalid_parameter(
                "concurrency",
                &self.concurrency,
                &"must be at least 1",
            ));
        }
        if self.top_candidates == 0 {
            return Err(invalid_parameter(
                "top_candidates",
                &self.top_candidates,
                &"must be at least 1",
            ));
        }
        if !(self.tie_break_fraction > 0.0 && self.tie_break_fraction <= 1.0) {
            return Err(invalid_parameter(
                "tie_break_fraction",
                &self.tie_break_fraction,
                &"must be in (0, 1]",
            ));
        }
        if self.raster_limit == 0 {
            return Err(invalid_parameter(
                "raster_limit",
                &self.raster_limit,
                &"must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Extraction worker count: hardware parallelism capped at [`MAX_CONCURRENCY`]
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map_or(1, std::num::NonZeroUsize::get)
        .min(MAX_CONCURRENCY)
}
