//! sRGB to CIE-Lab conversion
//!
//! The precise path goes through `palette` (linear sRGB, D65 white). The fast
//! path derives lightness from luma with two opponent-channel proxies.

use palette::{FromColor, LinSrgb, Srgb, white_point::D65};

/// Lab as the `palette` crate represents it, pinned to D65 and `f64`
pub type CieLab = palette::Lab<D65, f64>;

/// Maps an 8-bit channel difference onto the 0-100 Lab scale
const CHANNEL_TO_LAB: f64 = 100.0 / 255.0;

/// A color in CIE-Lab space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Lab {
    /// Lightness (0 to 100)
    pub l: f64,
    /// Green to red axis
    pub a: f64,
    /// Blue to yellow axis
    pub b: f64,
}

impl Lab {
    /// Create a Lab color from its components
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }
}

impl From<CieLab> for Lab {
    fn from(lab: CieLab) -> Self {
        Self::new(lab.l, lab.a, lab.b)
    }
}

impl From<Lab> for CieLab {
    fn from(lab: Lab) -> Self {
        Self::new(lab.l, lab.a, lab.b)
    }
}

/// Conversion strategy from 8-bit RGB to Lab
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabConversion {
    /// Full sRGB → XYZ → Lab conversion
    #[default]
    Precise,
    /// Luma plus chroma proxies
    Fast,
}

impl LabConversion {
    /// Convert an RGB triple with this strategy
    pub fn convert(self, rgb: [u8; 3]) -> Lab {
        match self {
            Self::Precise => rgb_to_lab(rgb),
            Self::Fast => rgb_to_lab_fast(rgb),
        }
    }
}

/// Convert sRGB to CIE-Lab using the D65 white point
pub fn rgb_to_lab(rgb: [u8; 3]) -> Lab {
    let [r, g, b] = rgb;
    let srgb: Srgb<f64> = Srgb::new(r, g, b).into_format();
    let linear: LinSrgb<f64> = srgb.into_linear();
    CieLab::from_color(linear).into()
}

/// Cheap Lab approximation for speed over precision
///
/// Lightness is Rec.601 luma scaled to 0-100, `a` is the red-green
/// difference and `b` the yellow-blue difference on the same scale.
pub fn rgb_to_lab_fast(rgb: [u8; 3]) -> Lab {
    let [r, g, b] = rgb.map(f64::from);
    let luma = 0.114f64.mul_add(b, 0.299f64.mul_add(r, 0.587 * g));

    Lab {
        l: luma * CHANNEL_TO_LAB,
        a: (r - g) * CHANNEL_TO_LAB,
        b: (r.mul_add(0.5, 0.5 * g) - b) * CHANNEL_TO_LAB,
    }
}
