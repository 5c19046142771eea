/// Rendering of dataset statistics and annotated captures
///
/// Charts are drawn with plotters into PNG files; annotated images are plain
/// `image::RgbImage` buffers that the caller saves.
pub mod charts;
pub mod grid;
pub mod overlay;
pub mod segmentation;
mod text;

use thiserror::Error;

pub use charts::{bar_plot, histogram_plot, rotation_plot, HistNorm, PlotOptions};
pub use grid::save_grid;
pub use overlay::{plot_bboxes, BoxStyle};
pub use segmentation::{blend, decode_segmap};

/// Errors from image overlays, segmentation blends and grids
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("'color' must be one of {0}")]
    UnknownColor(String),

    #[error("{colors} color(s) given for {boxes} box(es)")]
    MissingColors { boxes: usize, colors: usize },

    #[error("Dataset '{0}' is not supported.")]
    UnsupportedDataset(String),

    #[error("Blend alpha {0} is outside 0.0..=1.0")]
    InvalidAlpha(f32),

    #[error("Grid has no images")]
    EmptyGrid,

    #[error("Grid row {row} has {found} image(s), expected {expected}")]
    RaggedGrid { row: usize, expected: usize, found: usize },

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to create output directory: {0}")]
    Io(#[from] std::io::Error),
}
