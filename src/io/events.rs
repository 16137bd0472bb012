//! Events a run reports to its caller

use crate::algorithm::executor::MosaicResult;
use crate::analysis::extraction::TileFailure;
use crate::io::error::MosaicError;
use crate::io::progress::ProgressSnapshot;
use image::RgbaImage;
use std::sync::mpsc::Sender;

/// Low-resolution snapshot of the assignment in progress
#[derive(Clone, Debug)]
pub struct PreviewFrame {
    /// Cells along one side
    pub grid_size: u32,
    /// Cells assigned when the frame was taken
    pub cells_done: usize,
    /// One pixel per cell, transparent where nothing is placed yet
    pub raster: RgbaImage,
}

/// Notification emitted by a running generation
///
/// Every run ends with exactly one terminal event.
#[derive(Debug)]
pub enum EngineEvent {
    /// Progress changed
    Progress(ProgressSnapshot),
    /// Assignment preview
    Preview(PreviewFrame),
    /// A tile was excluded from the pool
    TileFailed(TileFailure),
    /// Terminal: the mosaic is ready
    Completed(Box<MosaicResult>),
    /// Terminal: the run was cancelled
    Cancelled,
    /// Terminal: the run stopped on an error
    Failed(MosaicError),
}

impl EngineEvent {
    /// Whether this event ends the run
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Cancelled | Self::Failed(_))
    }
}

/// Receiver of engine events
pub trait EventSink {
    /// Deliver one event; delivery is fire-and-forget
    fn emit(&mut self, event: EngineEvent);
}

impl EventSink for Vec<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.send(event);
    }
}

/// Adapts a closure into an [`EventSink`]
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: FnMut(EngineEvent),
{
    fn emit(&mut self, event: EngineEvent) {
        (self.0)(event);
    }
}
