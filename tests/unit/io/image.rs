//! Tests for tile discovery, decoding and PNG export

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tilemosaic::MosaicError;
    use tilemosaic::analysis::extraction::TileId;
    use tilemosaic::io::image::{
        collect_tile_files, has_tile_extension, load_rgba, load_tiles, save_png,
    };

    fn write_png(path: &Path, rgb: [u8; 3]) {
        let [r, g, b] = rgb;
        RgbaImage::from_pixel(4, 4, Rgba([r, g, b, 255]))
            .save(path)
            .expect("write test image");
    }

    #[test]
    fn test_has_tile_extension() {
        assert!(has_tile_extension(Path::new("a.png")));
        assert!(has_tile_extension(Path::new("dir/B.JPG")));
        assert!(has_tile_extension(Path::new("c.jpeg")));
        assert!(!has_tile_extension(Path::new("d.gif")));
        assert!(!has_tile_extension(Path::new("png")));
    }

    // Verifies only image files directly in the directory are listed, sorted
    // Verified by removing the sort
    #[test]
    fn test_collect_tile_files() {
        let temp = TempDir::new().expect("temp dir");
        write_png(&temp.path().join("b.png"), [0, 0, 255]);
        write_png(&temp.path().join("a.png"), [255, 0, 0]);
        fs::write(temp.path().join("notes.txt"), "ignore").expect("write");
        fs::create_dir(temp.path().join("nested.png")).expect("mkdir");

        let files = collect_tile_files(temp.path()).expect("collect");
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_collect_missing_directory() {
        let temp = TempDir::new().expect("temp dir");
        let result = collect_tile_files(&temp.path().join("missing"));
        assert!(matches!(result, Err(MosaicError::FileSystem { .. })));
    }

    // Tests undecodable files are skipped while ids keep following the path order
    // Verified by numbering only the decoded tiles
    #[test]
    fn test_load_tiles_skips_corrupt() {
        let temp = TempDir::new().expect("temp dir");
        let good = temp.path().join("a.png");
        let bad = temp.path().join("b.png");
        let other = temp.path().join("c.png");
        write_png(&good, [1, 2, 3]);
        fs::write(&bad, b"not an image").expect("write");
        write_png(&other, [4, 5, 6]);

        let (tiles, skipped) = load_tiles(&[good, bad.clone(), other]);
        let ids: Vec<TileId> = tiles.iter().map(|tile| tile.id).collect();
        assert_eq!(ids, vec![TileId(0), TileId(2)]);
        assert_eq!(tiles[1].filename, "c.png");
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, bad);
        assert!(matches!(skipped[0].1, MosaicError::ImageLoad { .. }));
    }

    // Verifies saving creates parent directories and writes a readable PNG
    #[test]
    fn test_save_png_round_trip() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("out/deeper/mosaic.png");
        let raster = RgbaImage::from_pixel(3, 2, Rgba([9, 99, 199, 255]));

        save_png(&raster, &path).expect("save");
        let loaded = load_rgba(&path).expect("load");
        assert_eq!(loaded, raster);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        assert!(matches!(
            load_rgba(&temp.path().join("nope.png")),
            Err(MosaicError::ImageLoad { .. })
        ));
    }
}
