//! Tests for alpha-weighted averages and dominant color buckets

#[cfg(test)]
mod tests {
    use image::Rgba;
    use tilemosaic::analysis::statistics::{average_color, dominant_colors};

    // Verifies opaque pixels average with rounding to nearest
    #[test]
    fn test_average_color_opaque() {
        let pixels = [Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255])];
        assert_eq!(average_color(pixels), Some([128, 0, 128]));
    }

    // Tests alpha weights each pixel's contribution and fully transparent pixels are skipped
    // Verified by averaging without the alpha weight
    #[test]
    fn test_average_color_alpha_weighted() {
        let pixels = [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 0, 255, 85]),
            Rgba([0, 255, 0, 0]),
        ];
        assert_eq!(average_color(pixels), Some([191, 0, 64]));
    }

    #[test]
    fn test_average_color_invisible() {
        assert_eq!(average_color([Rgba([10, 20, 30, 0]); 4]), None);
        assert_eq!(average_color(std::iter::empty()), None);
    }

    // Verifies buckets are ranked by population with weights over visible pixels
    // Verified by counting transparent pixels in the total
    #[test]
    fn test_dominant_colors_ranked() {
        let mut pixels = vec![Rgba([250, 10, 10, 255]); 6];
        pixels.extend([Rgba([10, 10, 250, 255]); 3]);
        pixels.push(Rgba([10, 250, 10, 255]));
        pixels.extend([Rgba([0, 0, 0, 0]); 5]);

        let dominant = dominant_colors(pixels, 32, 3);
        assert_eq!(dominant.len(), 3);
        assert_eq!(dominant[0].rgb, [250, 10, 10]);
        assert!((dominant[0].weight - 0.6).abs() < 1e-12);
        assert_eq!(dominant[1].rgb, [10, 10, 250]);
        assert!((dominant[1].weight - 0.3).abs() < 1e-12);
        assert_eq!(dominant[2].rgb, [10, 250, 10]);
    }

    // A bucket reports the mean of its members, not its corner
    #[test]
    fn test_dominant_colors_bucket_mean() {
        let pixels = [Rgba([64, 64, 64, 255]), Rgba([70, 70, 70, 255])];
        let dominant = dominant_colors(pixels, 32, 3);
        assert_eq!(dominant.len(), 1);
        assert_eq!(dominant[0].rgb, [67, 67, 67]);
        assert!((dominant[0].weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dominant_colors_limits() {
        let pixels: Vec<Rgba<u8>> = (0..8u8).map(|i| Rgba([i * 32, 0, 0, 255])).collect();
        assert_eq!(dominant_colors(pixels.clone(), 32, 3).len(), 3);
        assert_eq!(dominant_colors(pixels, 32, 0).len(), 0);
        assert!(dominant_colors([Rgba([1, 2, 3, 0])], 32, 3).is_empty());
    }

    // Equal populations resolve by bucket order
    #[test]
    fn test_dominant_colors_deterministic_ties() {
        let pixels = [Rgba([200, 0, 0, 255]), Rgba([0, 0, 200, 255])];
        let dominant = dominant_colors(pixels, 32, 2);
        assert_eq!(dominant[0].rgb, [0, 0, 200]);
        assert_eq!(dominant[1].rgb, [200, 0, 0]);
    }
}
