//! Stage-weighted progress tracking for one generation run

use crate::io::control::RunControl;
use crate::io::error::{MosaicError, Result, engine_fault};
use std::time::{Duration, Instant};

/// Pipeline stage of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Resolving source pixels and validating settings
    Loading,
    /// Per-tile metadata extraction
    Extraction,
    /// Source raster to grid cells
    ColorAnalysis,
    /// Building the slot index over extracted tiles
    Index,
    /// Tile selection for every cell
    Assignment,
    /// Rendering tile surfaces into the cache
    Optimize,
    /// Drawing the result raster
    Finalize,
}

impl Stage {
    /// Every stage in pipeline order
    pub const ALL: [Self; 7] = [
        Self::Loading,
        Self::Extraction,
        Self::ColorAnalysis,
        Self::Index,
        Self::Assignment,
        Self::Optimize,
        Self::Finalize,
    ];

    /// Stable identifier, never localized
    pub const fn id(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Extraction => "extraction",
            Self::ColorAnalysis => "color_analysis",
            Self::Index => "index",
            Self::Assignment => "assignment",
            Self::Optimize => "optimize",
            Self::Finalize => "finalize",
        }
    }

    /// Share of total progress in percent; all stages sum to 100
    pub const fn weight(self) -> f64 {
        match self {
            Self::Loading | Self::Index => 10.0,
            Self::Extraction => 20.0,
            Self::ColorAnalysis => 15.0,
            Self::Assignment => 40.0,
            Self::Optimize => 3.0,
            Self::Finalize => 2.0,
        }
    }

    /// Summed weight of the stages before this one
    pub fn completed_weight(self) -> f64 {
        Self::ALL
            .iter()
            .take_while(|stage| **stage != self)
            .map(|stage| stage.weight())
            .sum()
    }
}

/// Overall progress in percent for `stage_progress` percent through `stage`
pub fn total_progress(stage: Stage, stage_progress: f64) -> f64 {
    let clamped = stage_progress.clamp(0.0, 100.0);
    stage.weight().mul_add(clamped / 100.0, stage.completed_weight())
}

/// Remaining time extrapolated from the elapsed time and overall percent
///
/// Zero until any progress has been made.
pub fn estimate_remaining(elapsed: Duration, total: f64) -> Duration {
    if total <= 0.0 || total >= 100.0 {
        return Duration::ZERO;
    }
    elapsed.mul_f64((100.0 - total) / total)
}

/// Lifecycle of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Not started
    Idle,
    /// Stages executing
    Running,
    /// Parked at a checkpoint
    Paused,
    /// Result produced
    Completed,
    /// Stopped by request
    Cancelled,
    /// Stopped by an error
    Failed,
}

impl RunState {
    /// Whether no further transition can happen
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Point-in-time view of a run's progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSnapshot {
    /// Current stage
    pub stage: Stage,
    /// Progress through the current stage, 0 to 100
    pub stage_progress: f64,
    /// Overall progress, 0 to 100, never decreasing within a run
    pub total_progress: f64,
    /// Active time since start, pauses excluded
    pub elapsed_ms: u64,
    /// Estimated time to completion
    pub remaining_ms: u64,
    /// Whether the run is parked
    pub paused: bool,
    /// Whether the run was cancelled
    pub cancelled: bool,
}

/// Tracks stage progress and run state, and hosts the cooperative checkpoint
pub struct ProgressController<'a> {
    control: &'a RunControl,
    state: RunState,
    stage: Stage,
    stage_progress: f64,
    total: f64,
    started: Option<Instant>,
    paused_time: Duration,
}

impl<'a> ProgressController<'a> {
    /// Idle controller observing `control`
    pub const fn new(control: &'a RunControl) -> Self {
        Self {
            control,
            state: RunState::Idle,
            stage: Stage::Loading,
            stage_progress: 0.0,
            total: 0.0,
            started: None,
            paused_time: Duration::ZERO,
        }
    }

    /// Enter the running state with counters reset
    ///
    /// # Errors
    ///
    /// Returns an error if the controller was already started
    pub fn start(&mut self) -> Result<ProgressSnapshot> {
        if self.state != RunState::Idle {
            return Err(engine_fault(
                "progress",
                &format!("cannot start from {:?}", self.state),
            ));
        }
        self.state = RunState::Running;
        self.stage = Stage::Loading;
        self.stage_progress = 0.0;
        self.total = 0.0;
        self.paused_time = Duration::ZERO;
        self.started = Some(Instant::now());
        Ok(self.snapshot())
    }

    /// Record progress through `stage`
    ///
    /// Overall progress keeps its previous value if the new one would be lower.
    pub fn report(&mut self, stage: Stage, stage_progress: f64) -> ProgressSnapshot {
        self.stage = stage;
        self.stage_progress = stage_progress.clamp(0.0, 100.0);
        self.total = self.total.max(total_progress(stage, stage_progress));
        self.snapshot()
    }

    /// Cooperative checkpoint run by stage loops
    ///
    /// Parks while the run is paused. `notify` receives a snapshot when the
    /// pause takes effect and another when it lifts.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Cancelled`] once cancellation was requested
    pub fn checkpoint<F>(&mut self, mut notify: F) -> Result<()>
    where
        F: FnMut(ProgressSnapshot),
    {
        if self.control.is_cancelled() {
            return Err(MosaicError::Cancelled);
        }
        if !self.control.is_paused() {
            return Ok(());
        }

        self.state = RunState::Paused;
        notify(self.snapshot());
        tracing::debug!(stage = self.stage.id(), "Run paused");

        let parked = self.control.wait_while_paused()?;
        self.paused_time += parked;
        self.state = RunState::Running;
        tracing::debug!(
            stage = self.stage.id(),
            paused_ms = parked.as_millis() as u64,
            "Run resumed"
        );
        notify(self.snapshot());
        Ok(())
    }

    /// Active time since [`start`](Self::start), excluding pauses
    pub fn elapsed(&self) -> Duration {
        self.started.map_or(Duration::ZERO, |started| {
            started.elapsed().saturating_sub(self.paused_time)
        })
    }

    /// Current run state
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Overall progress in percent
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Current progress view
    pub fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self.elapsed();
        ProgressSnapshot {
            stage: self.stage,
            stage_progress: self.stage_progress,
            total_progress: self.total,
            elapsed_ms: elapsed.as_millis() as u64,
            remaining_ms: estimate_remaining(elapsed, self.total).as_millis() as u64,
            paused: self.state == RunState::Paused,
            cancelled: self.state == RunState::Cancelled || self.control.is_cancelled(),
        }
    }

    /// Final 100% state
    pub fn mark_completed(&mut self) -> ProgressSnapshot {
        self.stage = Stage::Finalize;
        self.stage_progress = 100.0;
        self.total = 100.0;
        self.state = RunState::Completed;
        self.snapshot()
    }

    /// Terminal cancelled state
    pub fn mark_cancelled(&mut self) -> ProgressSnapshot {
        self.state = RunState::Cancelled;
        self.snapshot()
    }

    /// Terminal failed state
    pub fn mark_failed(&mut self) -> ProgressSnapshot {
        self.state = RunState::Failed;
        self.snapshot()
    }
}
