//! Perception dataset JSON records
//!
//! Every file written by the Perception package is an object with a `version`
//! string and one array of records. Annotation and metric `values` are free-form
//! and stay as `serde_json::Value` until a table decodes them.
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DatasetError;

pub const CAPTURES_PREFIX: &str = "captures_";
pub const METRICS_PREFIX: &str = "metrics_";
pub const ANNOTATION_DEFINITIONS_FILE: &str = "annotation_definitions.json";
pub const METRIC_DEFINITIONS_FILE: &str = "metric_definitions.json";

/// Files carrying a format version.
pub trait Versioned {
    fn version(&self) -> &str;
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CapturesFile {
    pub version: String,
    pub captures: Vec<Capture>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Capture {
    pub id: String,
    #[serde(default)]
    pub sequence_id: String,
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub sensor: Sensor,
    #[serde(default)]
    pub ego: Option<Ego>,
    pub filename: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Sensor {
    #[serde(default)]
    pub sensor_id: String,
    #[serde(default)]
    pub ego_id: String,
    #[serde(default)]
    pub modality: String,
    #[serde(default)]
    pub translation: Vec<f64>,
    #[serde(default)]
    pub rotation: Vec<f64>,
    #[serde(default)]
    pub camera_intrinsic: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Ego {
    #[serde(default)]
    pub ego_id: String,
    #[serde(default)]
    pub translation: Vec<f64>,
    #[serde(default)]
    pub rotation: Vec<f64>,
    #[serde(default)]
    pub velocity: Option<Vec<f64>>,
    #[serde(default)]
    pub acceleration: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Annotation {
    pub id: String,
    pub annotation_definition: String,
    /// Set for image-valued annotations such as segmentation
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsFile {
    pub version: String,
    pub metrics: Vec<MetricRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub capture_id: Option<String>,
    #[serde(default)]
    pub annotation_id: Option<String>,
    #[serde(default)]
    pub sequence_id: Option<String>,
    #[serde(default)]
    pub step: Option<u64>,
    pub metric_definition: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnnotationDefinitionsFile {
    pub version: String,
    pub annotation_definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricDefinitionsFile {
    pub version: String,
    pub metric_definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Definition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub spec: Vec<Value>,
}

impl Definition {
    /// `label_id -> label_name` pairs from the `spec` records; entries without both keys are skipped.
    pub fn label_mappings(&self) -> Vec<(u64, String)> {
        self.spec
            .iter()
            .filter_map(|entry| {
                let id = entry.get("label_id")?.as_u64()?;
                let name = entry.get("label_name")?.as_str()?;
                Some((id, name.to_string()))
            })
            .collect()
    }
}

macro_rules! impl_versioned {
    ($($file:ty),*) => {
        $(impl Versioned for $file {
            fn version(&self) -> &str {
                &self.version
            }
        })*
    };
}

impl_versioned!(CapturesFile, MetricsFile, AnnotationDefinitionsFile, MetricDefinitionsFile);

/// Parse one dataset file and check its `version` field.
pub fn load_table<T>(path: &Path, version: &str) -> Result<T, DatasetError>
where
    T: DeserializeOwned + Versioned,
{
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table: T = serde_json::from_str(&content).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if table.version() != version {
        return Err(DatasetError::Version {
            path: path.to_path_buf(),
            expected: version.to_string(),
            found: table.version().to_string(),
        });
    }

    debug!("Parsed {} (version {})", path.display(), version);
    Ok(table)
}
