//! Tile metadata extraction over a bounded worker pool
//!
//! Tiles are processed in memory-control batches. Inside a batch a rayon pool
//! analyses tiles concurrently; between batches the caller gets a report it
//! can use for progress and cooperative cancellation.

use crate::algorithm::cache::{CacheKey, SurfaceSource, TileCache};
use crate::analysis::pixels::PixelSource;
use crate::analysis::statistics::{DominantColor, average_color, dominant_colors};
use crate::codec::rgb565::{CompressedPixels, compress};
use crate::codec::thumbnail::{downscale, square_thumbnail};
use crate::color::distance::ColorSample;
use crate::color::lab::LabConversion;
use crate::io::configuration::{
    DOMINANT_BUCKET_SIZE, DOMINANT_COLOR_COUNT, EngineConfig, THUMBNAIL_SIZE,
};
use crate::io::error::{MosaicError, Result, engine_fault};
use image::RgbaImage;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Caller-assigned identifier, stable per tile source file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u64);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One candidate tile as supplied by the caller
#[derive(Clone, Debug)]
pub struct TileInput {
    /// Stable identifier
    pub id: TileId,
    /// Original file name, used in reports only
    pub filename: String,
    /// Decoded pixels
    pub pixels: PixelSource,
}

/// Immutable metadata derived from one tile
#[derive(Clone, Debug)]
pub struct TileRecord {
    /// Stable identifier
    pub id: TileId,
    /// Original file name
    pub filename: String,
    /// Width of the supplied image
    pub width: u32,
    /// Height of the supplied image
    pub height: u32,
    /// Alpha-weighted average color
    pub average: ColorSample,
    /// Up to three most frequent colors, most frequent first
    pub dominant_colors: Vec<DominantColor>,
    /// Square thumbnail, retained for high-resolution reconstruction
    pub thumbnail: Arc<RgbaImage>,
    /// RGB565 encoding of the thumbnail
    pub compressed: CompressedPixels,
}

/// A tile that was excluded from the pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileFailure {
    /// Identifier of the failed tile
    pub tile_id: TileId,
    /// File name of the failed tile
    pub filename: String,
    /// Why the tile was rejected
    pub reason: String,
}

impl TileFailure {
    fn from_error(input_id: TileId, filename: String, error: &MosaicError) -> Self {
        let reason = match error {
            MosaicError::TileDecode { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self {
            tile_id: input_id,
            filename,
            reason,
        }
    }
}

/// Failure reason for a tile whose id was already supplied
pub const DUPLICATE_ID_REASON: &str = "duplicate tile id";

/// Progress report handed to the caller after each batch
#[derive(Debug)]
pub struct BatchReport<'a> {
    /// Tiles processed so far, successful or not
    pub completed: usize,
    /// Total number of tiles in the run
    pub total: usize,
    /// Failures that occurred in this batch
    pub failures: &'a [TileFailure],
}

/// Records and failures of a full extraction
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Successfully extracted tiles in input order
    pub records: Vec<TileRecord>,
    /// Tiles that were excluded
    pub failures: Vec<TileFailure>,
}

/// Batched, pooled tile analysis
pub struct MetadataExtractor {
    pool: rayon::ThreadPool,
    batch_size: usize,
    conversion: LabConversion,
}

impl MetadataExtractor {
    /// Build an extractor with `config.concurrency` workers
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be created
    pub fn new(config: &EngineConfig, conversion: LabConversion) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency.max(1))
            .thread_name(|index| format!("tile-extract-{index}"))
            .build()
            .map_err(|e| engine_fault("extraction", &e))?;

        Ok(Self {
            pool,
            batch_size: config.batch_size.max(1),
            conversion,
        })
    }

    /// Analyse a single tile
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::TileDecode`] if the pixels cannot be resolved or
    /// the tile has no visible pixel
    pub fn extract_tile(input: TileInput, conversion: LabConversion) -> Result<TileRecord> {
        let TileInput {
            id,
            filename,
            pixels,
        } = input;

        let decode_error = |reason: String| MosaicError::TileDecode {
            tile_id: id.0,
            filename: filename.clone(),
            reason,
        };

        let image = pixels.into_rgba().map_err(|e| decode_error(e.to_string()))?;
        let (width, height) = image.dimensions();

        let analysed = downscale(&image, THUMBNAIL_SIZE);
        let rgb = average_color(analysed.pixels().copied())
            .ok_or_else(|| decode_error("tile has no visible pixels".to_string()))?;
        let dominant = dominant_colors(
            analysed.pixels().copied(),
            DOMINANT_BUCKET_SIZE,
            DOMINANT_COLOR_COUNT,
        );

        let thumbnail = square_thumbnail(&image, THUMBNAIL_SIZE);
        let compressed = compress(&thumbnail);

        Ok(TileRecord {
            id,
            filename,
            width,
            height,
            average: ColorSample {
                rgb,
                lab: conversion.convert(rgb),
            },
            dominant_colors: dominant,
            thumbnail: Arc::new(thumbnail),
            compressed,
        })
    }

    /// Extract every tile, batch by batch
    ///
    /// Only the first input with a given id is extracted; later ones are
    /// reported as failures with the first batch. Thumbnails of successful
    /// tiles are stored in `cache` at render size [`THUMBNAIL_SIZE`].
    /// `after_batch` runs between batches; an error from it stops extraction
    /// and is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `after_batch`
    pub fn run<F>(
        &self,
        tiles: Vec<TileInput>,
        cache: &Mutex<TileCache>,
        mut after_batch: F,
    ) -> Result<ExtractionOutcome>
    where
        F: FnMut(BatchReport<'_>) -> Result<()>,
    {
        let total = tiles.len();
        let (unique, duplicates) = split_duplicates(tiles);
        for failure in &duplicates {
            tracing::warn!(
                tile_id = %failure.tile_id,
                filename = %failure.filename,
                "Duplicate tile id rejected"
            );
        }
        let mut completed = duplicates.len();
        let mut outcome = ExtractionOutcome {
            records: Vec::with_capacity(unique.len()),
            failures: duplicates,
        };
        let mut reported = 0;
        let mut remaining = unique.into_iter();

        loop {
            let batch: Vec<TileInput> = remaining.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            completed += batch.len();

            let conversion = self.conversion;
            let results: Vec<std::result::Result<TileRecord, TileFailure>> =
                self.pool.install(|| {
                    batch
                        .into_par_iter()
                        .map(|input| -> std::result::Result<TileRecord, TileFailure> {
                            let id = input.id;
                            let filename = input.filename.clone();
                            let record = Self::extract_tile(input, conversion)
                                .map_err(|e| TileFailure::from_error(id, filename, &e))?;
                            cache
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .insert(
                                    CacheKey::new(
                                        record.id,
                                        THUMBNAIL_SIZE,
                                        SurfaceSource::Thumbnail,
                                    ),
                                    Arc::clone(&record.thumbnail),
                                );
                            Ok(record)
                        })
                        .collect()
                });

            for result in results {
                match result {
                    Ok(record) => outcome.records.push(record),
                    Err(failure) => {
                        tracing::warn!(
                            tile_id = %failure.tile_id,
                            filename = %failure.filename,
                            reason = %failure.reason,
                            "Tile excluded from pool"
                        );
                        outcome.failures.push(failure);
                    }
                }
            }

            after_batch(BatchReport {
                completed,
                total,
                failures: outcome.failures.get(reported..).unwrap_or(&[]),
            })?;
            reported = outcome.failures.len();
        }

        tracing::info!(
            extracted = outcome.records.len(),
            failed = outcome.failures.len(),
            "Tile extraction finished"
        );
        Ok(outcome)
    }
}

/// Keep the first input of every id, turning the rest into failures
fn split_duplicates(tiles: Vec<TileInput>) -> (Vec<TileInput>, Vec<TileFailure>) {
    let mut seen = HashSet::with_capacity(tiles.len());
    let mut unique = Vec::with_capacity(tiles.len());
    let mut duplicates = Vec::new();

    for tile in tiles {
        if seen.insert(tile.id) {
            unique.push(tile);
        } else {
            duplicates.push(TileFailure {
                tile_id: tile.id,
                filename: tile.filename,
                reason: DUPLICATE_ID_REASON.to_string(),
            });
        }
    }
    (unique, duplicates)
}
