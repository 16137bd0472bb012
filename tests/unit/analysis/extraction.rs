//! Tests for single-tile extraction and the batched worker pool

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use tilemosaic::MosaicError;
    use tilemosaic::algorithm::cache::{CacheKey, SurfaceSource, TileCache};
    use tilemosaic::analysis::extraction::{
        DUPLICATE_ID_REASON, MetadataExtractor, TileId, TileInput,
    };
    use tilemosaic::analysis::pixels::PixelSource;
    use tilemosaic::color::lab::{LabConversion, rgb_to_lab, rgb_to_lab_fast};
    use tilemosaic::io::configuration::{EngineConfig, THUMBNAIL_SIZE};

    fn input(id: u64, image: RgbaImage) -> TileInput {
        TileInput {
            id: TileId(id),
            filename: format!("tile_{id}.png"),
            pixels: PixelSource::Rgba(image),
        }
    }

    fn solid(id: u64, rgb: [u8; 3]) -> TileInput {
        let [r, g, b] = rgb;
        input(id, RgbaImage::from_pixel(16, 16, Rgba([r, g, b, 255])))
    }

    fn extractor(batch_size: usize) -> MetadataExtractor {
        let config = EngineConfig {
            batch_size,
            concurrency: 2,
            ..EngineConfig::default()
        };
        MetadataExtractor::new(&config, LabConversion::Precise).expect("pool")
    }

    // Verifies a tile keeps its size and gets an average, dominant colors and a square thumbnail
    // Verified by storing the thumbnail dimensions as the tile dimensions
    #[test]
    fn test_extract_tile() {
        let image = RgbaImage::from_fn(128, 64, |x, _| {
            if x < 96 {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([255, 255, 0, 255])
            }
        });
        let record =
            MetadataExtractor::extract_tile(input(7, image), LabConversion::Fast).expect("extract");

        assert_eq!(record.id, TileId(7));
        assert_eq!(record.filename, "tile_7.png");
        assert_eq!((record.width, record.height), (128, 64));
        assert_eq!(record.thumbnail.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
        assert_eq!(
            (record.compressed.width(), record.compressed.height()),
            (THUMBNAIL_SIZE, THUMBNAIL_SIZE)
        );
        assert_eq!(record.average.lab, rgb_to_lab_fast(record.average.rgb));
        let [r, _, b] = record.dominant_colors[0].rgb;
        assert!(b > 200 && r < 50, "blue should dominate");
        assert!(record.dominant_colors.len() <= 3);
    }

    #[test]
    fn test_extract_solid_average() {
        let record = MetadataExtractor::extract_tile(solid(1, [12, 34, 56]), LabConversion::Precise)
            .expect("extract");
        assert_eq!(record.average.rgb, [12, 34, 56]);
        assert_eq!(record.average.lab, rgb_to_lab([12, 34, 56]));
    }

    // Tiles without visible pixels are decode failures
    #[test]
    fn test_extract_transparent_tile() {
        let result = MetadataExtractor::extract_tile(input(3, RgbaImage::new(8, 8)), LabConversion::Precise);
        assert!(matches!(result, Err(MosaicError::TileDecode { tile_id: 3, .. })));
    }

    // Verifies batches report cumulative progress and successful thumbnails land in the cache
    // Verified by reporting the batch size instead of the running total
    #[test]
    fn test_run_batches() {
        let tiles: Vec<TileInput> = (0..5).map(|id| solid(id, [id as u8 * 40, 0, 0])).collect();
        let cache = Mutex::new(TileCache::default());
        let mut reports = Vec::new();

        let outcome = extractor(2)
            .run(tiles, &cache, |report| {
                reports.push((report.completed, report.total));
                Ok(())
            })
            .expect("run");

        assert_eq!(reports, vec![(2, 5), (4, 5), (5, 5)]);
        let ids: Vec<TileId> = outcome.records.iter().map(|record| record.id).collect();
        assert_eq!(ids, (0..5).map(TileId).collect::<Vec<_>>());
        assert!(outcome.failures.is_empty());

        let guard = cache.lock().expect("cache lock");
        assert_eq!(guard.len(), 5);
        assert!(guard.contains(&CacheKey::new(
            TileId(4),
            THUMBNAIL_SIZE,
            SurfaceSource::Thumbnail
        )));
    }

    // Verifies a repeated id is rejected before extraction so the cached thumbnail is the first tile's
    // Verified by deduplicating after the pool has filled the cache
    #[test]
    fn test_run_rejects_duplicate_ids() {
        let tiles = vec![
            solid(7, [255, 0, 0]),
            solid(8, [0, 255, 0]),
            input(7, RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]))),
        ];
        let cache = Mutex::new(TileCache::default());
        let mut reports = Vec::new();

        let outcome = extractor(1)
            .run(tiles, &cache, |report| {
                reports.push((report.completed, report.failures.len()));
                Ok(())
            })
            .expect("run");

        assert_eq!(reports, vec![(2, 1), (3, 0)]);
        let ids: Vec<TileId> = outcome.records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![TileId(7), TileId(8)]);
        assert_eq!(outcome.records[0].average.rgb, [255, 0, 0]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].tile_id, TileId(7));
        assert_eq!(outcome.failures[0].reason, DUPLICATE_ID_REASON);

        let mut guard = cache.lock().expect("cache lock");
        let cached = guard
            .get(&CacheKey::new(TileId(7), THUMBNAIL_SIZE, SurfaceSource::Thumbnail))
            .expect("thumbnail cached");
        assert_eq!(*cached.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
    }

    // Failures are excluded, reported with their batch and do not stop the run
    #[test]
    fn test_run_failures() {
        let tiles = vec![
            solid(1, [1, 1, 1]),
            input(2, RgbaImage::new(4, 4)),
            solid(3, [3, 3, 3]),
        ];
        let cache = Mutex::new(TileCache::default());
        let mut batch_failures = Vec::new();

        let outcome = extractor(2)
            .run(tiles, &cache, |report| {
                batch_failures.push(report.failures.len());
                Ok(())
            })
            .expect("run");

        assert_eq!(batch_failures, vec![1, 0]);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].tile_id, TileId(2));
        assert_eq!(outcome.failures[0].reason, "tile has no visible pixels");
    }

    // An error from the batch callback stops extraction
    #[test]
    fn test_run_stops_on_error() {
        let tiles: Vec<TileInput> = (0..6).map(|id| solid(id, [0, 0, 0])).collect();
        let cache = Mutex::new(TileCache::default());
        let mut calls = 0;

        let result = extractor(2).run(tiles, &cache, |_| {
            calls += 1;
            Err(MosaicError::Cancelled)
        });
        assert!(matches!(result, Err(MosaicError::Cancelled)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_run_empty() {
        let cache = Mutex::new(TileCache::default());
        let mut calls = 0;
        let outcome = extractor(4)
            .run(Vec::new(), &cache, |_| {
                calls += 1;
                Ok(())
            })
            .expect("run");
        assert!(outcome.records.is_empty());
        assert_eq!(calls, 0);
    }
}
