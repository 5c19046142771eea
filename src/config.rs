use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use crate::settings::UserSettings;

// Default values for configuration
// These serve as fallback values when the settings file omits a key
pub const DEFAULT_OUTPUT_DIR: &str = "insights";
pub const DEFAULT_DATASET_VERSION: &str = "0.0.1";
pub const DEFAULT_MAX_SAMPLES: usize = 10_000;
pub const DEFAULT_HISTOGRAM_BINS: usize = 50;
pub const DEFAULT_BOX_LINE_WIDTH: u32 = 3;
pub const DEFAULT_FONT_SCALE: u32 = 50;
pub const DEFAULT_SEGMENTATION_ALPHA: f32 = 0.5;
pub const DEFAULT_PLOT_WIDTH: u32 = 1200;
pub const DEFAULT_PLOT_HEIGHT: u32 = 800;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,            // Where plots are written
    pub dataset_version: String,        // Expected JSON "version"
    pub max_samples: usize,             // Histogram down-sampling threshold
    pub histogram_bins: usize,
    pub box_line_width: u32,
    pub font_scale: u32,                // Label size = image width / font_scale
    pub segmentation_alpha: f32,
    pub plot_size: (u32, u32),          // Chart width and height
    pub sample_seed: u64,
}

impl Config {
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self {
            output_dir: PathBuf::from(&settings.output_dir),
            dataset_version: settings.dataset_version.clone(),
            max_samples: settings.max_samples,
            histogram_bins: settings.histogram_bins.max(1),
            box_line_width: settings.box_line_width.max(1),
            font_scale: settings.font_scale.max(1),
            segmentation_alpha: settings.segmentation_alpha,
            plot_size: (settings.plot_width, settings.plot_height),
            sample_seed: settings.sample_seed,
        }
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Resolves the configuration from the settings file. Only the first call has an effect.
pub fn init(settings_path: Option<&Path>) -> &'static Config {
    CONFIG.get_or_init(|| Config::from_settings(&UserSettings::load(settings_path)))
}
