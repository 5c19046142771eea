//! Tables over the parsed dataset files, keyed by definition id.
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use serde_json::{Map, Value};

use super::error::DatasetError;
use super::parser::{
    load_table, Annotation, AnnotationDefinitionsFile, Capture, CapturesFile, Definition,
    MetricDefinitionsFile, MetricsFile, MetricRecord, ANNOTATION_DEFINITIONS_FILE,
    CAPTURES_PREFIX, METRIC_DEFINITIONS_FILE, METRICS_PREFIX,
};
use crate::file_io::find_files;

fn numbered_json(prefix: &'static str) -> impl Fn(&str) -> bool {
    move |name: &str| name.starts_with(prefix) && name.ends_with(".json")
}

fn find_required<F>(root: &Path, pattern: &str, predicate: F) -> Result<Vec<PathBuf>, DatasetError>
where
    F: Fn(&str) -> bool,
{
    let files = find_files(root, predicate);
    if files.is_empty() {
        return Err(DatasetError::NotFound {
            root: root.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    Ok(files)
}

/// All captures of a dataset, in file order.
#[derive(Debug, Clone, Default)]
pub struct Captures {
    captures: Vec<Capture>,
}

/// One row of `Captures::filter`: a capture joined with one of its annotations.
#[derive(Debug, Clone, Copy)]
pub struct CaptureAnnotation<'a> {
    pub capture: &'a Capture,
    pub annotation: &'a Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox2D {
    pub label: u64,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub score: f32,
}

impl BBox2D {
    /// Decode a bounding box annotation value (`label_id`, `x`, `y`, `width`, `height`).
    pub fn from_value(value: &Value) -> Result<Self, DatasetError> {
        let number = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_f64)
                .ok_or_else(|| DatasetError::Malformed(format!("bounding box value without numeric '{key}': {value}")))
        };

        let label = value
            .get("label_id")
            .and_then(Value::as_u64)
            .ok_or_else(|| DatasetError::Malformed(format!("bounding box value without 'label_id': {value}")))?;

        Ok(Self {
            label,
            x: number("x")? as f32,
            y: number("y")? as f32,
            w: number("width")? as f32,
            h: number("height")? as f32,
            score: value.get("score").and_then(Value::as_f64).unwrap_or(1.0) as f32,
        })
    }

    /// (left, top, right, bottom)
    pub fn to_corners(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x + self.w, self.y + self.h)
    }
}

impl<'a> CaptureAnnotation<'a> {
    pub fn bboxes(&self) -> Result<Vec<BBox2D>, DatasetError> {
        self.annotation
            .values
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(BBox2D::from_value)
            .collect()
    }
}

impl Captures {
    /// Load every `captures_*.json` file under `data_root`.
    pub fn load(data_root: &Path, version: &str) -> Result<Self, DatasetError> {
        let files = find_required(data_root, "captures_*.json", numbered_json(CAPTURES_PREFIX))?;

        let parsed: Vec<CapturesFile> = files
            .par_iter()
            .map(|path| load_table::<CapturesFile>(path, version))
            .collect::<Result<_, _>>()?;

        let captures: Vec<Capture> = parsed.into_iter().flat_map(|file| file.captures).collect();
        info!("Loaded {} captures from {} file(s)", captures.len(), files.len());
        Ok(Self { captures })
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capture> {
        self.captures.iter()
    }

    /// Rows whose annotation references `def_id`, in capture order.
    pub fn filter(&self, def_id: &str) -> Result<Vec<CaptureAnnotation<'_>>, DatasetError> {
        let rows: Vec<_> = self
            .captures
            .iter()
            .flat_map(|capture| {
                capture
                    .annotations
                    .iter()
                    .filter(|annotation| annotation.annotation_definition == def_id)
                    .map(move |annotation| CaptureAnnotation { capture, annotation })
            })
            .collect();

        if rows.is_empty() {
            return Err(DatasetError::DefinitionId(def_id.to_string()));
        }
        debug!("{} annotation rows for definition {}", rows.len(), def_id);
        Ok(rows)
    }
}

/// One element of a metric record's `values`, with the parent record's ids.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    pub capture_id: Option<String>,
    pub annotation_id: Option<String>,
    pub sequence_id: Option<String>,
    pub step: Option<u64>,
    pub fields: Map<String, Value>,
}

impl MetricValue {
    fn from_record(record: &MetricRecord, value: &Value) -> Self {
        let fields = match value {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
        };

        Self {
            capture_id: record.capture_id.clone(),
            annotation_id: record.annotation_id.clone(),
            sequence_id: record.sequence_id.clone(),
            step: record.step,
            fields,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// All metric records of a dataset, in file order.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    records: Vec<MetricRecord>,
}

impl Metrics {
    /// Load every `metrics_*.json` file under `data_root`.
    pub fn load(data_root: &Path, version: &str) -> Result<Self, DatasetError> {
        let files = find_required(data_root, "metrics_*.json", numbered_json(METRICS_PREFIX))?;

        let parsed: Vec<MetricsFile> = files
            .par_iter()
            .map(|path| load_table::<MetricsFile>(path, version))
            .collect::<Result<_, _>>()?;

        let records: Vec<MetricRecord> = parsed.into_iter().flat_map(|file| file.metrics).collect();
        info!("Loaded {} metric records from {} file(s)", records.len(), files.len());
        Ok(Self { records })
    }

    #[cfg(test)]
    pub fn from_records(records: Vec<MetricRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One row per value of every record whose definition is `def_id`.
    pub fn filter_metrics(&self, def_id: &str) -> Result<Vec<MetricValue>, DatasetError> {
        let matching: Vec<&MetricRecord> = self
            .records
            .iter()
            .filter(|record| record.metric_definition == def_id)
            .collect();

        if matching.is_empty() {
            return Err(DatasetError::DefinitionId(def_id.to_string()));
        }

        let rows: Vec<MetricValue> = matching
            .iter()
            .flat_map(|record| record.values.iter().map(move |value| MetricValue::from_record(record, value)))
            .collect();

        debug!("{} metric rows from {} records for definition {}", rows.len(), matching.len(), def_id);
        Ok(rows)
    }
}

/// Annotation or metric definitions.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    definitions: Vec<Definition>,
}

impl Definitions {
    pub fn load_annotation_definitions(data_root: &Path, version: &str) -> Result<Self, DatasetError> {
        let files = find_required(data_root, ANNOTATION_DEFINITIONS_FILE, |name| name == ANNOTATION_DEFINITIONS_FILE)?;
        let file = load_table::<AnnotationDefinitionsFile>(&files[0], version)?;
        Ok(Self::from_definitions(file.annotation_definitions))
    }

    pub fn load_metric_definitions(data_root: &Path, version: &str) -> Result<Self, DatasetError> {
        let files = find_required(data_root, METRIC_DEFINITIONS_FILE, |name| name == METRIC_DEFINITIONS_FILE)?;
        let file = load_table::<MetricDefinitionsFile>(&files[0], version)?;
        Ok(Self::from_definitions(file.metric_definitions))
    }

    pub fn from_definitions(definitions: Vec<Definition>) -> Self {
        Self { definitions }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn get_definition(&self, def_id: &str) -> Result<&Definition, DatasetError> {
        self.definitions
            .iter()
            .find(|definition| definition.id == def_id)
            .ok_or_else(|| DatasetError::DefinitionId(def_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::definitions::{BOUNDING_BOX, RENDERED_OBJECT_INFO, SEMANTIC_SEGMENTATION};
    use crate::perception::fixtures::{write_dataset, VERSION};

    #[test]
    fn test_captures_filter_by_definition() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());

        let captures = Captures::load(dir.path(), VERSION).unwrap();
        assert_eq!(captures.len(), 3);

        let rows = captures.filter(BOUNDING_BOX).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].capture.id, "capture-a");

        let boxes = rows[0].bboxes().unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].to_corners(), (2.0, 3.0, 12.0, 11.0));
        assert_eq!(boxes[0].score, 1.0);

        let segmentation = captures.filter(SEMANTIC_SEGMENTATION).unwrap();
        assert_eq!(segmentation.len(), 1);
        assert!(segmentation[0].annotation.filename.is_some());
    }

    #[test]
    fn test_filter_unknown_definition_is_recoverable() {
        let captures = Captures::default();
        let err = captures.filter("missing").unwrap_err();
        assert!(err.is_definition_missing());
    }

    #[test]
    fn test_metrics_are_exploded_per_value() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());

        let metrics = Metrics::load(dir.path(), VERSION).unwrap();
        let rows = metrics.filter_metrics(RENDERED_OBJECT_INFO).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].capture_id.as_deref(), Some("capture-a"));
        assert_eq!(rows[0].get_u64("visible_pixels"), Some(120));

        assert!(metrics.filter_metrics("missing").unwrap_err().is_definition_missing());
    }

    #[test]
    fn test_scalar_metric_values_land_in_value_column() {
        let record = MetricRecord {
            capture_id: Some("c".to_string()),
            annotation_id: None,
            sequence_id: None,
            step: Some(4),
            metric_definition: "scalar".to_string(),
            values: vec![serde_json::json!(0.25)],
        };

        let rows = Metrics::from_records(vec![record]).filter_metrics("scalar").unwrap();
        assert_eq!(rows[0].get_f64("value"), Some(0.25));
        assert_eq!(rows[0].step, Some(4));
    }

    #[test]
    fn test_definitions_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());

        let annotations = Definitions::load_annotation_definitions(dir.path(), VERSION).unwrap();
        assert_eq!(annotations.get_definition(BOUNDING_BOX).unwrap().name, "bounding box");
        assert!(annotations.get_definition("nope").unwrap_err().is_definition_missing());

        let metrics = Definitions::load_metric_definitions(dir.path(), VERSION).unwrap();
        let mappings = metrics.get_definition(RENDERED_OBJECT_INFO).unwrap().label_mappings();
        assert_eq!(mappings.len(), 3);
    }

    #[test]
    fn test_missing_files_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Captures::load(dir.path(), VERSION).unwrap_err(),
            DatasetError::NotFound { .. }
        ));
    }

    #[test]
    fn test_malformed_bbox_value() {
        let err = BBox2D::from_value(&serde_json::json!({"label_id": 1, "x": 0.0})).unwrap_err();
        assert!(matches!(err, DatasetError::Malformed(_)));
    }
}
