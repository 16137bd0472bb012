//! Terminal progress bar for a running generation

use crate::io::progress::ProgressSnapshot;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::sync::LazyLock;
use std::time::Duration;

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix:>12} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Renders engine progress snapshots as a single bar
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDisplay {
    /// Bar scaled to percent
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(PROGRESS_STYLE.clone());
        Self { bar }
    }

    /// Bar that draws nothing, for quiet runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Show one snapshot
    pub fn update(&self, snapshot: &ProgressSnapshot) {
        self.bar.set_prefix(snapshot.stage.id());
        self.bar.set_position(snapshot.total_progress.round() as u64);
        self.bar.set_message(status_message(snapshot));
    }

    /// Print a line above the bar
    pub fn note(&self, message: &str) {
        self.bar.println(message);
    }

    /// Leave the bar at its final state
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Remove the bar from the terminal
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Status text shown after the bar
pub fn status_message(snapshot: &ProgressSnapshot) -> String {
    if snapshot.cancelled {
        return "cancelling".to_string();
    }
    if snapshot.paused {
        return "paused".to_string();
    }
    if snapshot.total_progress <= 0.0 {
        return String::new();
    }
    format!(
        "ETA {}",
        HumanDuration(Duration::from_millis(snapshot.remaining_ms))
    )
}
