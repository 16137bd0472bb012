//! Orchestration of one mosaic generation run
//!
//! A run owns its cache, progress and failure list through an
//! `EngineContext`; nothing is shared between runs. Stages execute in order on
//! the calling thread apart from tile extraction, which uses a bounded pool.

use crate::{
    algorithm::{
        assignment::{AssignmentEngine, AssignmentOptions, AssignmentStats},
        cache::TileCache,
        compositor::{Compositor, GridInfo, plan_tile_size, preview_raster},
        index::TileIndex,
    },
    analysis::{
        cells::analyze_source,
        extraction::{MetadataExtractor, TileFailure, TileId, TileInput, TileRecord},
        pixels::PixelSource,
    },
    color::distance::DistanceMetric,
    io::{
        configuration::{EngineConfig, MosaicSettings},
        control::{ControlHandle, RunControl},
        error::{MosaicError, Result, WithContext, engine_fault, invalid_parameter},
        events::{EngineEvent, EventSink, PreviewFrame},
        progress::{ProgressController, Stage},
    },
};
use image::RgbaImage;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// The tile drawn at one grid position
#[derive(Clone, Debug)]
pub struct Placement {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
    /// Metadata of the placed tile, including its retained pixels
    pub tile: Arc<TileRecord>,
}

impl Placement {
    /// Identifier of the placed tile
    pub fn tile_id(&self) -> TileId {
        self.tile.id
    }

    /// Average color of the placed tile
    pub fn average_color(&self) -> [u8; 3] {
        self.tile.average.rgb
    }

    /// Retained 64×64 pixels of the placed tile
    pub fn original_pixels(&self) -> &Arc<RgbaImage> {
        &self.tile.thumbnail
    }
}

/// Everything a completed run produces
#[derive(Clone, Debug)]
pub struct MosaicResult {
    /// Composited mosaic
    pub raster: Arc<RgbaImage>,
    /// Geometry the raster was drawn with
    pub grid: GridInfo,
    /// Tiles available to the assignment
    pub tile_count: usize,
    /// One placement per cell, row-major
    pub placements: Vec<Placement>,
    /// Placements per tile, in index order
    pub usage: Vec<(TileId, usize)>,
    /// Assignment constraint counters
    pub stats: AssignmentStats,
    /// Tiles excluded during the run
    pub failures: Vec<TileFailure>,
}

impl MosaicResult {
    /// Placement at `(x, y)`
    pub fn placement(&self, x: u32, y: u32) -> Option<&Placement> {
        let index = y as usize * self.grid.grid_size as usize + x as usize;
        self.placements
            .get(index)
            .filter(|placement| placement.x == x && placement.y == y)
    }
}

fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    }
}

/// Progress controller paired with the sink its snapshots go to
struct Reporter<'a, S: EventSink> {
    progress: ProgressController<'a>,
    sink: &'a mut S,
}

impl<S: EventSink> Reporter<'_, S> {
    fn emit(&mut self, event: EngineEvent) {
        self.sink.emit(event);
    }

    fn report(&mut self, stage: Stage, stage_progress: f64) {
        let snapshot = self.progress.report(stage, stage_progress);
        self.sink.emit(EngineEvent::Progress(snapshot));
    }

    fn checkpoint(&mut self) -> Result<()> {
        let sink = &mut *self.sink;
        self.progress
            .checkpoint(|snapshot| sink.emit(EngineEvent::Progress(snapshot)))
    }

    fn advance(&mut self, stage: Stage, stage_progress: f64) -> Result<()> {
        self.report(stage, stage_progress);
        self.checkpoint()
    }
}

/// State owned by a single run
struct EngineContext<'a, S: EventSink> {
    settings: MosaicSettings,
    config: EngineConfig,
    reporter: Reporter<'a, S>,
    cache: Mutex<TileCache>,
    failures: Vec<TileFailure>,
}

impl<'a, S: EventSink> EngineContext<'a, S> {
    fn new(
        settings: MosaicSettings,
        config: EngineConfig,
        control: &'a RunControl,
        sink: &'a mut S,
    ) -> Self {
        Self {
            settings,
            config,
            reporter: Reporter {
                progress: ProgressController::new(control),
                sink,
            },
            cache: Mutex::new(TileCache::new(
                config.cache_max_entries,
                config.cache_max_bytes,
            )),
            failures: Vec::new(),
        }
    }

    fn record_failures(&mut self, failures: impl IntoIterator<Item = TileFailure>) {
        for failure in failures {
            self.reporter.emit(EngineEvent::TileFailed(failure.clone()));
            self.failures.push(failure);
        }
    }

    fn execute(&mut self, source: PixelSource, tiles: Vec<TileInput>) -> Result<MosaicResult> {
        let started = self.reporter.progress.start()?;
        self.reporter.emit(EngineEvent::Progress(started));

        // Loading
        self.config.validate()?;
        self.settings.validate(&self.config)?;
        let image = source.into_rgba()?;
        let grid = plan_tile_size(
            self.settings.grid_size,
            self.settings.tile_size,
            self.config.raster_limit,
            1,
        )?;
        tracing::info!(
            width = image.width(),
            height = image.height(),
            grid_size = grid.grid_size,
            tile_size = grid.tile_size,
            tiles = tiles.len(),
            "Starting mosaic generation"
        );
        self.reporter.advance(Stage::Loading, 100.0)?;

        // Extraction
        let conversion = self.settings.quality.lab_conversion();
        let extractor =
            MetadataExtractor::new(&self.config, conversion).with_stage(Stage::Extraction)?;
        let reporter = &mut self.reporter;
        let extracted = extractor
            .run(tiles, &self.cache, |batch| {
                for failure in batch.failures {
                    reporter.emit(EngineEvent::TileFailed(failure.clone()));
                }
                reporter.advance(Stage::Extraction, percent(batch.completed, batch.total))
            })
            .with_stage(Stage::Extraction)?;
        self.failures.extend(extracted.failures);
        self.reporter.advance(Stage::Extraction, 100.0)?;

        // Color analysis
        let grid_rows = self.settings.grid_size as usize;
        let reporter = &mut self.reporter;
        let cells = analyze_source(&image, self.settings.grid_size, conversion, |rows| {
            reporter.advance(Stage::ColorAnalysis, percent(rows as usize, grid_rows))
        })
        .with_stage(Stage::ColorAnalysis)?;
        drop(image);

        // Index
        let record_count = extracted.records.len();
        let reporter = &mut self.reporter;
        let (index, duplicates) = TileIndex::build(extracted.records, |done| {
            if done % 256 == 0 {
                reporter.report(Stage::Index, percent(done, record_count));
            }
        });
        if !duplicates.is_empty() {
            tracing::warn!(count = duplicates.len(), "Duplicate tile ids rejected");
        }
        self.record_failures(duplicates);
        if index.is_empty() {
            return Err(invalid_parameter(
                "tiles",
                &index.len(),
                &format!("no usable tiles ({} failed)", self.failures.len()),
            ));
        }
        self.reporter.advance(Stage::Index, 100.0)?;

        // Assignment
        let options = AssignmentOptions {
            metric: DistanceMetric::resolve(self.settings.color_matching, self.settings.quality),
            neighbor_diversity: self.settings.neighbor_diversity,
            top_candidates: self.config.top_candidates,
            tie_break_fraction: self.config.tie_break_fraction,
            seed: self.config.seed,
        };
        let engine = AssignmentEngine::new(index.samples(), self.settings.grid_size, options)
            .with_stage(Stage::Assignment)?;
        let total_cells = cells.len();
        let report_interval = (total_cells / 100).max(1);
        let preview_interval = (self.config.preview_frames > 0)
            .then(|| (total_cells / self.config.preview_frames).max(1));
        let grid_size = self.settings.grid_size;
        let reporter = &mut self.reporter;
        let assignment = engine
            .run(&cells, |done, placements| {
                if done % report_interval == 0 || done == total_cells {
                    reporter.report(Stage::Assignment, percent(done, total_cells));
                }
                if preview_interval.is_some_and(|interval| done % interval == 0) {
                    reporter.emit(EngineEvent::Preview(PreviewFrame {
                        grid_size,
                        cells_done: done,
                        raster: preview_raster(placements, &index),
                    }));
                }
                reporter.checkpoint()
            })
            .with_stage(Stage::Assignment)?;

        // Optimize
        let compositor = Compositor::new(grid.tile_size, self.settings.quality);
        let used: Vec<&TileRecord> = index
            .records()
            .iter()
            .zip(assignment.usage.as_slice())
            .filter(|(_, count)| **count > 0)
            .map(|(record, _)| record.as_ref())
            .collect();
        let cache = self.cache.get_mut().unwrap_or_else(PoisonError::into_inner);
        let used_count = used.len().min(compositor.surface_budget(cache));
        let reporter = &mut self.reporter;
        compositor.prepare(used, cache, |done| {
            reporter.report(Stage::Optimize, percent(done, used_count));
        });
        self.reporter.advance(Stage::Optimize, 100.0)?;

        // Finalize
        let reporter = &mut self.reporter;
        let raster = compositor
            .composite(&assignment.placements, &index, cache, |rows| {
                reporter.advance(Stage::Finalize, percent(rows, grid_rows))
            })
            .with_stage(Stage::Finalize)?;

        let placements: Vec<Placement> = assignment
            .placements
            .iter_row_major()
            .filter_map(|(x, y, slot)| {
                let tile = index.record(slot?)?;
                Some(Placement {
                    x: x as u32,
                    y: y as u32,
                    tile: Arc::clone(tile),
                })
            })
            .collect();
        if placements.len() != total_cells {
            return Err(engine_fault(
                Stage::Finalize.id(),
                &format!("{} placements for {total_cells} cells", placements.len()),
            ));
        }

        let usage = index
            .records()
            .iter()
            .zip(assignment.usage.as_slice())
            .map(|(record, count)| (record.id, *count))
            .collect();

        tracing::debug!(
            hits = cache.stats.hits,
            misses = cache.stats.misses,
            evictions = cache.stats.evictions,
            "Surface cache statistics"
        );
        tracing::info!(
            tiles = index.len(),
            failures = self.failures.len(),
            fallbacks = assignment.stats.fallbacks,
            dimension = grid.dimension(),
            "Mosaic generation finished"
        );

        Ok(MosaicResult {
            raster: Arc::new(raster),
            grid,
            tile_count: index.len(),
            placements,
            usage,
            stats: assignment.stats,
            failures: std::mem::take(&mut self.failures),
        })
    }

    fn finish(mut self, outcome: Result<MosaicResult>) -> Option<MosaicResult> {
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        match outcome {
            Ok(result) => {
                let snapshot = self.reporter.progress.mark_completed();
                self.reporter.emit(EngineEvent::Progress(snapshot));
                self.reporter
                    .emit(EngineEvent::Completed(Box::new(result.clone())));
                Some(result)
            }
            Err(MosaicError::Cancelled) => {
                tracing::info!(
                    stage = self.reporter.progress.snapshot().stage.id(),
                    "Mosaic generation cancelled"
                );
                let snapshot = self.reporter.progress.mark_cancelled();
                self.reporter.emit(EngineEvent::Progress(snapshot));
                self.reporter.emit(EngineEvent::Cancelled);
                None
            }
            Err(error) => {
                tracing::error!(%error, "Mosaic generation failed");
                let snapshot = self.reporter.progress.mark_failed();
                self.reporter.emit(EngineEvent::Progress(snapshot));
                self.reporter.emit(EngineEvent::Failed(error));
                None
            }
        }
    }
}

/// Generate a mosaic of `source` from `tiles` on the calling thread
///
/// Emits progress, preview and tile-failure events to `sink`, then exactly
/// one terminal event. A panic inside the run, including one raised on an
/// extraction worker, ends it with [`EngineEvent::Failed`]. Returns the
/// result only when the run completed.
pub fn generate<S: EventSink>(
    source: PixelSource,
    settings: MosaicSettings,
    tiles: Vec<TileInput>,
    config: &EngineConfig,
    control: &RunControl,
    sink: &mut S,
) -> Option<MosaicResult> {
    let mut context = EngineContext::new(settings, *config, control, sink);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| context.execute(source, tiles)))
        .unwrap_or_else(|payload| {
            Err(engine_fault("generation", &panic_message(payload.as_ref())))
        });
    context.finish(outcome)
}

/// A generation running on its own thread
pub struct GenerationHandle {
    /// Events of the run, ending with a terminal event
    pub events: Receiver<EngineEvent>,
    /// Pause, resume and cancel requests for the run
    pub control: ControlHandle,
    thread: JoinHandle<()>,
}

impl GenerationHandle {
    /// Wait for the engine thread to exit
    ///
    /// # Errors
    ///
    /// Returns an error if the engine thread panicked
    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|payload| engine_fault("generation thread", &panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked".to_string())
}

/// Run [`generate`] on a dedicated thread
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned
pub fn spawn_generation(
    source: PixelSource,
    settings: MosaicSettings,
    tiles: Vec<TileInput>,
    config: EngineConfig,
) -> Result<GenerationHandle> {
    let (mut sender, events) = mpsc::channel();
    let control = ControlHandle::new();
    let engine_control = control.clone();

    let thread = std::thread::Builder::new()
        .name("mosaic-engine".to_string())
        .spawn(move || {
            generate(
                source,
                settings,
                tiles,
                &config,
                engine_control.control(),
                &mut sender,
            );
        })
        .map_err(|e| engine_fault("generation thread", &e))?;

    Ok(GenerationHandle {
        events,
        control,
        thread,
    })
}
