use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info, warn, error};

use crate::config::{
    DEFAULT_BOX_LINE_WIDTH, DEFAULT_DATASET_VERSION, DEFAULT_FONT_SCALE, DEFAULT_HISTOGRAM_BINS,
    DEFAULT_MAX_SAMPLES, DEFAULT_OUTPUT_DIR, DEFAULT_PLOT_HEIGHT, DEFAULT_PLOT_WIDTH,
    DEFAULT_SAMPLE_SEED, DEFAULT_SEGMENTATION_ALPHA,
};

/// User-specific settings that persist across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Directory where plots and overlays are written
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Expected `version` field of the dataset JSON files
    #[serde(default = "default_dataset_version")]
    pub dataset_version: String,

    /// Histograms randomly sample down to this many values
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Bounding box outline width in pixels
    #[serde(default = "default_box_line_width")]
    pub box_line_width: u32,

    /// How many label characters fit across the image width
    #[serde(default = "default_font_scale")]
    pub font_scale: u32,

    /// Weight of the segmentation image when blending over the RGB capture
    #[serde(default = "default_segmentation_alpha")]
    pub segmentation_alpha: f32,

    #[serde(default = "default_plot_width")]
    pub plot_width: u32,

    #[serde(default = "default_plot_height")]
    pub plot_height: u32,

    /// Seed for histogram and rotation plot sampling
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,
}

/// A string as a single-line YAML scalar, quoted and escaped when needed
fn yaml_scalar(value: &str) -> String {
    match serde_yaml::to_string(value) {
        Ok(yaml) if !yaml.trim_end().contains('\n') => yaml.trim_end().to_string(),
        _ => serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value)),
    }
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_dataset_version() -> String {
    DEFAULT_DATASET_VERSION.to_string()
}

fn default_max_samples() -> usize {
    DEFAULT_MAX_SAMPLES
}

fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

fn default_box_line_width() -> u32 {
    DEFAULT_BOX_LINE_WIDTH
}

fn default_font_scale() -> u32 {
    DEFAULT_FONT_SCALE
}

fn default_segmentation_alpha() -> f32 {
    DEFAULT_SEGMENTATION_ALPHA
}

fn default_plot_width() -> u32 {
    DEFAULT_PLOT_WIDTH
}

fn default_plot_height() -> u32 {
    DEFAULT_PLOT_HEIGHT
}

fn default_sample_seed() -> u64 {
    DEFAULT_SAMPLE_SEED
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            dataset_version: default_dataset_version(),
            max_samples: DEFAULT_MAX_SAMPLES,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            box_line_width: DEFAULT_BOX_LINE_WIDTH,
            font_scale: DEFAULT_FONT_SCALE,
            segmentation_alpha: DEFAULT_SEGMENTATION_ALPHA,
            plot_width: DEFAULT_PLOT_WIDTH,
            plot_height: DEFAULT_PLOT_HEIGHT,
            sample_seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

impl UserSettings {
    /// Get the path to the settings file
    /// On macOS: ~/Library/Application Support/synthscope/settings.yaml
    /// On Linux: ~/.config/synthscope/settings.yaml
    /// On Windows: C:\Users\<user>\AppData\Roaming\synthscope\settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        config_dir.join("synthscope").join("settings.yaml")
    }

    /// Load settings from the YAML file
    /// If custom_path is provided, uses that path; otherwise uses the default settings path
    pub fn load(custom_path: Option<&Path>) -> Self {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p.display());
                p.to_path_buf()
            }
            None => Self::settings_path(),
        };

        if !path.exists() {
            debug!("Settings file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => {
                match serde_yaml::from_str::<UserSettings>(&contents) {
                    Ok(settings) => {
                        info!("Loaded settings from {:?}", path);
                        debug!("Settings: output_dir={}, version={}, max_samples={}, bins={}",
                            settings.output_dir, settings.dataset_version, settings.max_samples, settings.histogram_bins);
                        settings
                    }
                    Err(e) => {
                        error!("Failed to parse settings file at {:?}: {}", path, e);
                        warn!("Using default settings");
                        Self::default()
                    }
                }
            }
            Err(e) => {
                error!("Failed to read settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to the YAML file while preserving comments
    pub fn save(&self, custom_path: Option<&Path>) -> Result<(), String> {
        let path = custom_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::settings_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create settings directory: {}", e))?;
            }
        }

        // Existing files get in-place value updates so user comments survive
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    let updated = self.update_yaml_values(&contents);
                    fs::write(&path, updated)
                        .map_err(|e| format!("Failed to write settings file: {}", e))?;
                    info!("Saved settings to {:?} (comments preserved)", path);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Failed to read existing settings file for comment preservation: {}", e);
                }
            }
        }

        let yaml = self.to_yaml_with_comments();
        fs::write(&path, yaml)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Update YAML values while preserving existing comments and structure
    fn update_yaml_values(&self, yaml_content: &str) -> String {
        let mut result = yaml_content.to_string();

        result = Self::replace_yaml_value(&result, "output_dir", &yaml_scalar(&self.output_dir));
        result = Self::replace_yaml_value(&result, "dataset_version", &yaml_scalar(&self.dataset_version));
        result = Self::replace_yaml_value(&result, "max_samples", &self.max_samples.to_string());
        result = Self::replace_yaml_value(&result, "histogram_bins", &self.histogram_bins.to_string());
        result = Self::replace_yaml_value(&result, "box_line_width", &self.box_line_width.to_string());
        result = Self::replace_yaml_value(&result, "font_scale", &self.font_scale.to_string());
        result = Self::replace_yaml_value(&result, "segmentation_alpha", &self.segmentation_alpha.to_string());
        result = Self::replace_yaml_value(&result, "plot_width", &self.plot_width.to_string());
        result = Self::replace_yaml_value(&result, "plot_height", &self.plot_height.to_string());
        result = Self::replace_yaml_value(&result, "sample_seed", &self.sample_seed.to_string());

        result
    }

    /// Replace a YAML key's value while preserving the rest of the line
    fn replace_yaml_value(yaml: &str, key: &str, new_value: &str) -> String {
        let pattern = format!(r"(?m)^(\s*{}\s*:\s*).*$", regex::escape(key));

        match regex::Regex::new(&pattern) {
            Ok(re) => re
                .replace_all(yaml, |caps: &regex::Captures| format!("{}{}", &caps[1], new_value))
                .to_string(),
            Err(e) => {
                warn!("Failed to create regex for key '{}': {}", key, e);
                yaml.to_string()
            }
        }
    }

    /// Generate YAML content with comments for new files
    fn to_yaml_with_comments(&self) -> String {
        format!(
            r#"# synthscope User Settings
# This file is loaded automatically on every run.
# Command line flags override the values below.

# Directory where charts and overlays are written
output_dir: {}

# Expected "version" field of captures/metrics/definition files
dataset_version: {}

# Histograms and rotation plots randomly sample down to this many values
max_samples: {}

# Number of equal-width histogram bins
histogram_bins: {}

# Bounding box outline width in pixels
box_line_width: {}

# Label font size is image_width / font_scale
font_scale: {}

# Segmentation blend weight (0.0 = RGB only, 1.0 = segmentation only)
segmentation_alpha: {}

# Chart size in pixels
plot_width: {}
plot_height: {}

# Seed used when sampling values for plots
sample_seed: {}
"#,
            yaml_scalar(&self.output_dir),
            yaml_scalar(&self.dataset_version),
            self.max_samples,
            self.histogram_bins,
            self.box_line_width,
            self.font_scale,
            self.segmentation_alpha,
            self.plot_width,
            self.plot_height,
            self.sample_seed
        )
    }
}
