//! Color difference metrics used for tile matching

use crate::color::lab::{CieLab, Lab};
use crate::io::configuration::{ColorMatching, Quality, RGB_DISTANCE_WEIGHTS};
use palette::color_difference::Ciede2000;

/// A color carried in both 8-bit RGB and Lab form
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorSample {
    /// Gamma-encoded 8-bit RGB
    pub rgb: [u8; 3],
    /// Lab representation of `rgb`
    pub lab: Lab,
}

/// Concrete distance formula applied during assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Weighted Euclidean distance on RGB channels
    WeightedRgb,
    /// Euclidean distance in Lab (CIE76)
    Cie76,
    /// CIEDE2000 color difference
    Ciede2000,
}

impl DistanceMetric {
    /// Pick the formula for a matching mode at a quality level
    pub const fn resolve(matching: ColorMatching, quality: Quality) -> Self {
        match (matching, quality) {
            (ColorMatching::Rgb, _) => Self::WeightedRgb,
            (ColorMatching::Lab, Quality::High) => Self::Ciede2000,
            (ColorMatching::Lab, Quality::Low | Quality::Medium) => Self::Cie76,
        }
    }
}

/// Distance between two samples under `metric`
pub fn distance(a: &ColorSample, b: &ColorSample, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::WeightedRgb => weighted_rgb_distance(a.rgb, b.rgb),
        DistanceMetric::Cie76 => lab_distance(a.lab, b.lab),
        DistanceMetric::Ciede2000 => delta_e_2000(a.lab, b.lab),
    }
}

/// Weighted Euclidean RGB distance using [`RGB_DISTANCE_WEIGHTS`]
pub fn weighted_rgb_distance(a: [u8; 3], b: [u8; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .zip(RGB_DISTANCE_WEIGHTS.iter())
        .map(|((&x, &y), &weight)| {
            let delta = f64::from(x) - f64::from(y);
            weight * delta * delta
        })
        .sum::<f64>()
        .sqrt()
}

/// Euclidean distance in Lab space (Delta-E 1976)
pub fn lab_distance(a: Lab, b: Lab) -> f64 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    dl.mul_add(dl, da.mul_add(da, db * db)).sqrt()
}

/// CIEDE2000 color difference with unit weighting factors
pub fn delta_e_2000(lab1: Lab, lab2: Lab) -> f64 {
    CieLab::from(lab1).difference(CieLab::from(lab2))
}
