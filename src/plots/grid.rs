//! Image grids for side-by-side comparison of captures.
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use log::{info, warn};

use super::text::{draw_text, text_size};
use super::RenderError;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const TITLE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const TITLE_FONT_SIZE: u32 = 24;
const TITLE_PADDING: u32 = 8;

/// Tile a row-major 2D list of images into one image, every image resized to `cell_size`.
pub fn grid_plot(images: &[Vec<RgbImage>], cell_size: (u32, u32)) -> Result<RgbImage, RenderError> {
    let n_cols = images.first().map(Vec::len).unwrap_or(0);
    if n_cols == 0 || cell_size.0 == 0 || cell_size.1 == 0 {
        return Err(RenderError::EmptyGrid);
    }
    if let Some((row, cells)) = images.iter().enumerate().find(|(_, cells)| cells.len() != n_cols) {
        return Err(RenderError::RaggedGrid { row, expected: n_cols, found: cells.len() });
    }

    let (cell_width, cell_height) = cell_size;
    let mut grid = RgbImage::from_pixel(cell_width * n_cols as u32, cell_height * images.len() as u32, BACKGROUND);

    for (i, row) in images.iter().enumerate() {
        for (j, image) in row.iter().enumerate() {
            let x = (j as u32 * cell_width) as i64;
            let y = (i as u32 * cell_height) as i64;
            if image.dimensions() == cell_size {
                imageops::replace(&mut grid, image, x, y);
            } else {
                let cell = imageops::resize(image, cell_width, cell_height, FilterType::Triangle);
                imageops::replace(&mut grid, &cell, x, y);
            }
        }
    }

    Ok(grid)
}

/// `grid` with a white band on top holding `title`.
fn with_title(grid: &RgbImage, title: &str) -> RgbImage {
    let (text_width, text_height) = text_size(title, TITLE_FONT_SIZE);
    let band = text_height + 2 * TITLE_PADDING;

    let mut titled = RgbImage::from_pixel(grid.width(), grid.height() + band, BACKGROUND);
    imageops::replace(&mut titled, grid, 0, band as i64);

    let x = grid.width().saturating_sub(text_width) / 2;
    if let Err(e) = draw_text(&mut titled, title, (x as i32, TITLE_PADDING as i32), TITLE_FONT_SIZE, TITLE_COLOR) {
        warn!("Grid title '{}' not drawn: {}", title, e);
    }
    titled
}

/// Write `folder/<title>.png` with a title band and `<folder>_notitles/<title>.png` without.
pub fn save_grid(
    images: &[Vec<RgbImage>],
    cell_size: (u32, u32),
    title: &str,
    folder: &Path,
) -> Result<(PathBuf, PathBuf), RenderError> {
    let grid = grid_plot(images, cell_size)?;

    let mut plain_folder = folder.as_os_str().to_owned();
    plain_folder.push("_notitles");
    let plain_folder = PathBuf::from(plain_folder);

    fs::create_dir_all(folder)?;
    fs::create_dir_all(&plain_folder)?;

    let file_name = format!("{title}.png");
    let titled_path = folder.join(&file_name);
    let plain_path = plain_folder.join(&file_name);

    with_title(&grid, title).save(&titled_path)?;
    grid.save(&plain_path)?;

    info!("Saved grid to {} and {}", titled_path.display(), plain_path.display());
    Ok((titled_path, plain_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn test_grid_layout_is_row_major() {
        let images = vec![vec![solid(4, 4, 10), solid(4, 4, 20)], vec![solid(4, 4, 30), solid(8, 8, 40)]];
        let grid = grid_plot(&images, (4, 4)).unwrap();

        assert_eq!(grid.dimensions(), (8, 8));
        assert_eq!(*grid.get_pixel(1, 1), Rgb([10, 10, 10]));
        assert_eq!(*grid.get_pixel(5, 1), Rgb([20, 20, 20]));
        assert_eq!(*grid.get_pixel(1, 5), Rgb([30, 30, 30]));
        assert_eq!(*grid.get_pixel(6, 6), Rgb([40, 40, 40]));
    }

    #[test]
    fn test_grid_rejects_empty_and_ragged() {
        assert!(matches!(grid_plot(&[], (4, 4)), Err(RenderError::EmptyGrid)));
        assert!(matches!(grid_plot(&[vec![]], (4, 4)), Err(RenderError::EmptyGrid)));

        let ragged = vec![vec![solid(2, 2, 0), solid(2, 2, 0)], vec![solid(2, 2, 0)]];
        assert!(matches!(
            grid_plot(&ragged, (2, 2)),
            Err(RenderError::RaggedGrid { row: 1, expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_save_grid_writes_both_variants() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("sim2real");
        let images = vec![vec![solid(4, 4, 10), solid(4, 4, 20)]];

        let (titled, plain) = save_grid(&images, (4, 4), "comparison", &folder).unwrap();
        assert_eq!(titled, folder.join("comparison.png"));
        assert_eq!(plain, dir.path().join("sim2real_notitles").join("comparison.png"));

        let plain_image = image::open(&plain).unwrap().to_rgb8();
        assert_eq!(plain_image.dimensions(), (8, 4));
        let titled_image = image::open(&titled).unwrap().to_rgb8();
        assert_eq!(titled_image.width(), 8);
        assert!(titled_image.height() > 4);
    }
}
