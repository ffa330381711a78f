//! File helpers shared by the sources and the front ends.

use crate::error::{Result, ScanError};
use crate::export::ExportFormat;
use chrono::{DateTime, Local};
use image::{DynamicImage, GenericImageView};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions recognized as images when walking a directory.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif"];

/// True if `path` has one of [`IMAGE_EXTENSIONS`], ignoring case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Load an image file. The format is sniffed from the file contents, so a
/// misnamed file still loads.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ScanError::unreadable(path, "file not found"));
    }
    image::io::Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| ScanError::unreadable(path, err))?
        .decode()
        .map_err(|err| ScanError::unreadable(path, err))
}

/// Shrink `img` so its longer side is at most `max_dim`.
///
/// Images already within bounds are returned unchanged.
pub fn downscale(img: DynamicImage, max_dim: Option<u32>) -> DynamicImage {
    let Some(max_dim) = max_dim else {
        return img;
    };
    let (width, height) = img.dimensions();
    if width.max(height) <= max_dim {
        return img;
    }
    img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
}

/// Image files under `root` in lexicographic path order.
///
/// Subdirectories are walked only when `recursive` is set. Unreadable
/// subdirectories are skipped; an unreadable `root` is an error.
pub fn collect_images(root: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();
    let mut at_root = true;

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if at_root => return Err(err),
            Err(err) => {
                log::warn!("skipping unreadable directory {}: {err}", dir.display());
                continue;
            }
        };
        at_root = false;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if recursive {
                    stack.push(path);
                }
                continue;
            }
            if is_supported_image(&path) && path.is_file() {
                images.push(path);
            }
        }
    }

    images.sort();
    Ok(images)
}

/// Default export name used when the caller did not pick one.
pub fn default_output_path(now: DateTime<Local>, format: ExportFormat) -> PathBuf {
    let ext = match format {
        ExportFormat::Json => "json",
        ExportFormat::Text => "txt",
    };
    PathBuf::from(format!("qr_results_{}.{ext}", now.format("%Y%m%d_%H%M%S")))
}
