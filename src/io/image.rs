//! Decoding source and tile files and writing finished mosaics

use crate::analysis::extraction::{TileId, TileInput};
use crate::analysis::pixels::PixelSource;
use crate::io::error::{MosaicError, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// File extensions accepted as tile images
pub const TILE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Whether `path` carries a tile image extension, case-insensitively
pub fn has_tile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TILE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Decode an image file into RGBA pixels
///
/// # Errors
///
/// Returns [`MosaicError::ImageLoad`] if the file cannot be opened or decoded
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(image::DynamicImage::into_rgba8)
        .map_err(|source| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}

/// Image files directly inside `dir`, sorted by path
///
/// # Errors
///
/// Returns [`MosaicError::FileSystem`] if the directory cannot be read
pub fn collect_tile_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_error = |source| MosaicError::FileSystem {
        path: dir.to_path_buf(),
        operation: "read tile directory",
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && has_tile_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Decode tile files into engine inputs
///
/// Ids follow the order of `paths`. Files that fail to decode are skipped with
/// a warning and returned alongside as `(path, error)`.
pub fn load_tiles(paths: &[PathBuf]) -> (Vec<TileInput>, Vec<(PathBuf, MosaicError)>) {
    let mut tiles = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for (index, path) in paths.iter().enumerate() {
        match load_rgba(path) {
            Ok(pixels) => tiles.push(TileInput {
                id: TileId(index as u64),
                filename: path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
                pixels: PixelSource::Rgba(pixels),
            }),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Skipping undecodable tile");
                skipped.push((path.clone(), error));
            }
        }
    }

    (tiles, skipped)
}

/// Write `raster` as a PNG, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image cannot be
/// encoded
pub fn save_png(raster: &RgbaImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    raster
        .save_with_format(output_path, image::ImageFormat::Png)
        .map_err(|e| MosaicError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })
}
