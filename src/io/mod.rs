//! Configuration, errors, run control and file I/O

/// Command-line interface
pub mod cli;
/// Constants and runtime settings
pub mod configuration;
/// Pause, resume and cancel signalling
pub mod control;
/// Terminal progress bar
pub mod display;
/// Error types
pub mod error;
/// Engine events and sinks
pub mod events;
/// Image file loading and saving
pub mod image;
/// Stage-weighted progress tracking
pub mod progress;
