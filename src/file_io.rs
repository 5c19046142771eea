use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

pub fn get_filename(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|os_str| os_str.to_str())
        .map(|s| s.to_string())
}

pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|metadata| metadata.is_dir()).unwrap_or(false)
}

/// Recursively collects files under `root` whose file name satisfies `predicate`.
///
/// Results are sorted in natural order so that `captures_2.json` comes before
/// `captures_10.json`. Unreadable directories are skipped.
pub fn find_files<F>(root: &Path, predicate: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> bool,
{
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.file_name().and_then(OsStr::to_str).is_some_and(&predicate) {
                found.push(path);
            }
        }
    }

    // Sort paths like a file manager would; `sort()` puts 10 before 2
    alphanumeric_sort::sort_path_slice(&mut found);
    found
}

pub fn get_image_paths(directory_path: &Path) -> Vec<PathBuf> {
    let mut image_paths: Vec<PathBuf> = Vec::new();

    if let Ok(paths) = fs::read_dir(directory_path) {
        for entry in paths.flatten() {
            if let Some(extension) = entry.path().extension().and_then(OsStr::to_str) {
                if IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
                    image_paths.push(entry.path());
                }
            }
        }
    }

    alphanumeric_sort::sort_path_slice(&mut image_paths);
    image_paths
}

/// Decodes an image file into 8-bit RGB, dropping any alpha channel.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage, String> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to open image {}: {}", path.display(), e))?;
    debug!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
    Ok(image.to_rgb8())
}

/// Joins a dataset-relative file name onto the data root and checks it exists.
pub fn resolve_data_file(data_root: &Path, relative: &str) -> Result<PathBuf, String> {
    let path = data_root.join(relative);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File {} referenced by the dataset does not exist", path.display()))
    }
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    if is_directory(path) {
        return Ok(());
    }
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))?;
    info!("Created output directory {}", path.display());
    Ok(())
}
