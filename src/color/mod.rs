//! Color space conversion and perceptual matching

/// Perceptual and weighted color difference metrics
pub mod distance;
/// sRGB to CIE-Lab conversion, precise and approximate
pub mod lab;

pub use distance::{ColorSample, DistanceMetric};
pub use lab::Lab;
