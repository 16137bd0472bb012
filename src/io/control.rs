//! Cooperative pause, resume and cancel signalling between a caller and a run

use crate::io::error::{MosaicError, Result};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Requested state of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlState {
    /// Stage loops proceed
    Running,
    /// Stage loops park at their next checkpoint
    Paused,
    /// Stage loops stop at their next checkpoint; terminal
    Cancelled,
}

/// Shared control flag that stage loops poll at checkpoints
///
/// Paused loops park on a condition variable and are woken by both
/// [`resume`](Self::resume) and [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct RunControl {
    state: Mutex<ControlState>,
    changed: Condvar,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    /// Control in the running state
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(ControlState::Running),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, from: ControlState, to: ControlState) -> bool {
        let mut state = self.lock();
        if *state != from {
            return false;
        }
        *state = to;
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Request a pause; `false` unless the run was running
    pub fn pause(&self) -> bool {
        self.transition(ControlState::Running, ControlState::Paused)
    }

    /// Lift a pause; `false` unless the run was paused
    pub fn resume(&self) -> bool {
        self.transition(ControlState::Paused, ControlState::Running)
    }

    /// Request cancellation; `false` if already cancelled
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if *state == ControlState::Cancelled {
            return false;
        }
        *state = ControlState::Cancelled;
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Current requested state
    pub fn state(&self) -> ControlState {
        *self.lock()
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.state() == ControlState::Cancelled
    }

    /// Whether a pause is in effect
    pub fn is_paused(&self) -> bool {
        self.state() == ControlState::Paused
    }

    /// Block while paused
    ///
    /// Returns how long the caller was parked.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Cancelled`] if cancellation was requested before
    /// or during the wait
    pub fn wait_while_paused(&self) -> Result<Duration> {
        let started = Instant::now();
        let state = self
            .changed
            .wait_while(self.lock(), |state| *state == ControlState::Paused)
            .unwrap_or_else(PoisonError::into_inner);

        if *state == ControlState::Cancelled {
            return Err(MosaicError::Cancelled);
        }
        Ok(started.elapsed())
    }
}

/// Cloneable handle to a run's control, usable from any thread
#[derive(Clone, Debug, Default)]
pub struct ControlHandle(Arc<RunControl>);

impl ControlHandle {
    /// Handle to a fresh running control
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared control behind the handle
    pub fn control(&self) -> &RunControl {
        &self.0
    }

    /// See [`RunControl::pause`]
    pub fn pause(&self) -> bool {
        self.0.pause()
    }

    /// See [`RunControl::resume`]
    pub fn resume(&self) -> bool {
        self.0.resume()
    }

    /// See [`RunControl::cancel`]
    pub fn cancel(&self) -> bool {
        self.0.cancel()
    }

    /// See [`RunControl::state`]
    pub fn state(&self) -> ControlState {
        self.0.state()
    }
}
