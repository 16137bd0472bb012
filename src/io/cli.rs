//! Command-line interface: decode files, run the engine, write the mosaic

use crate::algorithm::compositor::reconstruct_high_resolution;
use crate::algorithm::executor::{MosaicResult, spawn_generation};
use crate::analysis::pixels::PixelSource;
use crate::io::configuration::{
    ColorMatching, DEFAULT_GRID_SIZE, DEFAULT_SEED, DEFAULT_TILE_SIZE, EngineConfig,
    HIRES_SUFFIX, MosaicSettings, OUTPUT_SUFFIX, Quality,
};
use crate::io::display::ProgressDisplay;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::events::EngineEvent;
use crate::io::image::{collect_tile_files, load_rgba, load_tiles, save_png};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "tilemosaic")]
#[command(
    author,
    version,
    about = "Recreate a picture as a grid of tile pictures"
)]
/// Command-line arguments for mosaic generation
// Independent on/off switches map naturally to separate flags
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Picture to recreate
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory of PNG/JPEG tile pictures
    #[arg(value_name = "TILES_DIR")]
    pub tiles: PathBuf,

    /// Cells along each side of the square grid
    #[arg(short, long, default_value_t = DEFAULT_GRID_SIZE)]
    pub grid_size: u32,

    /// Rendered tile side length in pixels
    #[arg(short, long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    /// Speed versus fidelity trade-off
    #[arg(long, value_enum, default_value_t = Quality::Medium)]
    pub quality: Quality,

    /// Color space used for matching
    #[arg(long, value_enum, default_value_t = ColorMatching::Lab)]
    pub color_matching: ColorMatching,

    /// Allow the same tile in adjacent cells
    #[arg(long)]
    pub no_diversity: bool,

    /// Random seed for reproducible tie-breaking
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Output PNG path (defaults to <SOURCE>_mosaic.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a high-resolution copy at this tile size
    #[arg(long)]
    pub export_tile_size: Option<u32>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Log engine stages
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Generation settings selected by the flags
    pub const fn settings(&self) -> MosaicSettings {
        MosaicSettings {
            grid_size: self.grid_size,
            tile_size: self.tile_size,
            quality: self.quality,
            color_matching: self.color_matching,
            neighbor_diversity: !self.no_diversity,
        }
    }

    /// Engine configuration with the selected seed
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            seed: self.seed,
            ..EngineConfig::default()
        }
    }

    /// Where the mosaic is written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| suffixed_path(&self.source, OUTPUT_SUFFIX))
    }

    /// Where the high-resolution copy is written
    pub fn hires_path(&self) -> PathBuf {
        suffixed_path(&self.output_path(), HIRES_SUFFIX)
    }

    /// Default log filter when `RUST_LOG` is unset
    pub const fn log_filter(&self) -> &'static str {
        if self.verbose {
            "tilemosaic=info"
        } else {
            "tilemosaic=warn"
        }
    }

    /// Install the global log subscriber on stderr
    pub fn init_tracing(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(self.log_filter()));
        // A subscriber installed earlier in the process stays in place
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .without_time()
            .try_init();
    }
}

/// `dir/stem<suffix>.png` next to `path`
pub fn suffixed_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    let name = format!("{}{suffix}.png", stem.to_string_lossy());
    path.parent()
        .map_or_else(|| PathBuf::from(&name), |parent| parent.join(&name))
}

/// Runs one generation from the command line
pub struct MosaicCommand {
    cli: Cli,
    display: ProgressDisplay,
}

impl MosaicCommand {
    /// Command for the parsed arguments
    pub fn new(cli: Cli) -> Self {
        let display = if cli.quiet {
            ProgressDisplay::hidden()
        } else {
            ProgressDisplay::new()
        };
        Self { cli, display }
    }

    /// Load inputs, generate and write the mosaic
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs cannot be read, the run fails or the
    /// output cannot be written
    pub fn run(&self) -> Result<MosaicResult> {
        let source = load_rgba(&self.cli.source)?;
        let files = collect_tile_files(&self.cli.tiles)?;
        if files.is_empty() {
            return Err(invalid_parameter(
                "tiles",
                &self.cli.tiles.display(),
                &"directory contains no PNG or JPEG files",
            ));
        }

        let (tiles, skipped) = load_tiles(&files);
        for (path, error) in &skipped {
            self.display
                .note(&format!("skipped {}: {error}", path.display()));
        }

        let config = self.cli.engine_config();
        let handle = spawn_generation(
            PixelSource::Rgba(source),
            self.cli.settings(),
            tiles,
            config,
        )?;

        let mut outcome = Err(MosaicError::Cancelled);
        for event in &handle.events {
            match event {
                EngineEvent::Progress(snapshot) => self.display.update(&snapshot),
                EngineEvent::Preview(frame) => {
                    tracing::debug!(cells = frame.cells_done, "Preview frame");
                }
                EngineEvent::TileFailed(failure) => self.display.note(&format!(
                    "tile {} excluded: {}",
                    failure.filename, failure.reason
                )),
                EngineEvent::Completed(result) => outcome = Ok(*result),
                EngineEvent::Cancelled => outcome = Err(MosaicError::Cancelled),
                EngineEvent::Failed(error) => outcome = Err(error),
            }
        }
        handle.join()?;

        let result = match outcome {
            Ok(result) => result,
            Err(error) => {
                self.display.clear();
                return Err(error);
            }
        };

        let output = self.cli.output_path();
        save_png(&result.raster, &output)?;

        if let Some(tile_size) = self.cli.export_tile_size {
            let (raster, grid) =
                reconstruct_high_resolution(&result, tile_size, &config, self.cli.quality)?;
            save_png(&raster, &self.cli.hires_path())?;
            tracing::info!(tile_size = grid.tile_size, "High-resolution copy written");
        }

        self.display.finish(&format!(
            "{} ({} tiles, {}px)",
            output.display(),
            result.tile_count,
            result.grid.dimension()
        ));
        Ok(result)
    }
}
