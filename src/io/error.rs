//! Error types and context management for mosaic generation

use crate::io::progress::Stage;
use std::fmt;
use std::path::PathBuf;

/// Main error type for all engine operations
#[derive(Debug)]
pub enum MosaicError {
    /// A single tile could not be decoded or analysed
    ///
    /// Non-fatal for a run: the tile is excluded from the pool and the batch continues.
    TileDecode {
        /// Caller-supplied tile identifier
        tile_id: u64,
        /// Original file name of the tile
        filename: String,
        /// Description of what went wrong
        reason: String,
    },

    /// The run was cancelled through its control handle
    Cancelled,

    /// The requested raster cannot be built under the configured dimension ceiling
    SizeLimitExceeded {
        /// Number of cells along one side of the grid
        grid_size: u32,
        /// Smallest tile size that was attempted
        tile_size: u32,
        /// Resulting raster side length in pixels
        dimension: u64,
        /// Maximum raster side length in pixels
        limit: u32,
    },

    /// Unexpected internal error; aborts the run
    EngineFault {
        /// Operation or stage that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// Settings or configuration validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to load an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a generated image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl MosaicError {
    /// Whether the error unwinds a run through cancellation rather than failure
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TileDecode {
                tile_id,
                filename,
                reason,
            } => {
                write!(f, "Failed to decode tile {tile_id} ('{filename}'): {reason}")
            }
            Self::Cancelled => write!(f, "Generation was cancelled"),
            Self::SizeLimitExceeded {
                grid_size,
                tile_size,
                dimension,
                limit,
            } => {
                write!(
                    f,
                    "Raster of {dimension}px ({grid_size} cells at {tile_size}px) exceeds the {limit}px limit"
                )
            }
            Self::EngineFault { operation, reason } => {
                write!(f, "Engine fault in {operation}: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for engine results
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Tags engine faults with the pipeline stage they surfaced in
pub trait WithContext<T> {
    /// Attach the stage identifier to an [`MosaicError::EngineFault`]
    ///
    /// Other error kinds pass through untouched.
    ///
    /// # Errors
    ///
    /// Propagates the original error with the stage context applied
    fn with_stage(self, stage: Stage) -> Result<T>;
}

impl<T, E> WithContext<T> for std::result::Result<T, E>
where
    E: Into<MosaicError>,
{
    fn with_stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| match e.into() {
            MosaicError::EngineFault { reason, .. } => MosaicError::EngineFault {
                operation: stage.id(),
                reason,
            },
            other => other,
        })
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an engine fault
pub fn engine_fault(operation: &'static str, reason: &impl ToString) -> MosaicError {
    MosaicError::EngineFault {
        operation,
        reason: reason.to_string(),
    }
}
