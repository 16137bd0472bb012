//! Color statistics over pixel buffers

use image::Rgba;
use std::collections::HashMap;

/// A representative color and its share of the visible pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DominantColor {
    /// Mean color of the pixels in the bucket
    pub rgb: [u8; 3],
    /// Fraction of visible pixels that fell into the bucket (0 to 1)
    pub weight: f64,
}

/// Alpha-weighted mean color, skipping fully transparent pixels
///
/// Returns `None` when no pixel is visible.
pub fn average_color<I>(pixels: I) -> Option<[u8; 3]>
where
    I: IntoIterator<Item = Rgba<u8>>,
{
    let mut sums = [0u64; 3];
    let mut alpha_total = 0u64;

    for Rgba([r, g, b, a]) in pixels {
        if a == 0 {
            continue;
        }
        let alpha = u64::from(a);
        sums[0] += u64::from(r) * alpha;
        sums[1] += u64::from(g) * alpha;
        sums[2] += u64::from(b) * alpha;
        alpha_total += alpha;
    }

    (alpha_total > 0).then(|| {
        sums.map(|sum| ((sum + alpha_total / 2) / alpha_total).min(u64::from(u8::MAX)) as u8)
    })
}

#[derive(Default)]
struct Bucket {
    count: u64,
    sums: [u64; 3],
}

/// Most frequent colors after coarse quantization
///
/// Visible pixels are grouped into cubes of `bucket_size` per channel and
/// ranked by population. Equal populations keep bucket order so the result is
/// deterministic.
pub fn dominant_colors<I>(pixels: I, bucket_size: u8, count: usize) -> Vec<DominantColor>
where
    I: IntoIterator<Item = Rgba<u8>>,
{
    let width = bucket_size.max(1);
    let mut buckets: HashMap<[u8; 3], Bucket> = HashMap::new();
    let mut visible = 0u64;

    for Rgba([r, g, b, a]) in pixels {
        if a == 0 {
            continue;
        }
        let bucket = buckets.entry([r / width, g / width, b / width]).or_default();
        bucket.count += 1;
        bucket.sums[0] += u64::from(r);
        bucket.sums[1] += u64::from(g);
        bucket.sums[2] += u64::from(b);
        visible += 1;
    }

    if visible == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<([u8; 3], Bucket)> = buckets.into_iter().collect();
    ranked.sort_by(|(key_a, a), (key_b, b)| b.count.cmp(&a.count).then(key_a.cmp(key_b)));

    ranked
        .into_iter()
        .take(count)
        .map(|(_, bucket)| DominantColor {
            rgb: bucket
                .sums
                .map(|sum| ((sum + bucket.count / 2) / bucket.count) as u8),
            weight: bucket.count as f64 / visible as f64,
        })
        .collect()
}
