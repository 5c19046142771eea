//! Dataset statistics
//!
//! Aggregations over filtered metric rows: rendered object info (objects per
//! capture and per label), summed object counts and pandas-style `describe`.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use log::{debug, warn};

use crate::perception::{DatasetError, Definitions, MetricValue, Metrics};

const LABEL: &str = "label_id";
const LABEL_READABLE: &str = "label_name";
const INSTANCE: &str = "instance_id";
const VALUE_COLUMN: &str = "visible_pixels";
const COUNT_COLUMN: &str = "count";

/// One row of the rendered object info metric.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedObject {
    pub capture_id: String,
    pub label_id: u64,
    pub instance_id: u64,
    pub visible_pixels: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelCount {
    pub label_id: u64,
    pub label_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureCount {
    pub capture_id: String,
    pub count: u64,
}

/// Per-capture visibility of every rendered object.
#[derive(Debug, Clone)]
pub struct RenderedObjectInfo {
    raw_table: Vec<RenderedObject>,
    label_mappings: BTreeMap<u64, String>,
}

impl RenderedObjectInfo {
    pub fn load(data_root: &Path, version: &str, def_id: &str) -> Result<Self, DatasetError> {
        let metrics = Metrics::load(data_root, version)?;
        let definitions = Definitions::load_metric_definitions(data_root, version)?;
        Self::from_tables(&metrics, &definitions, def_id)
    }

    pub fn from_tables(metrics: &Metrics, definitions: &Definitions, def_id: &str) -> Result<Self, DatasetError> {
        let definition = definitions.get_definition(def_id)?;
        let label_mappings = definition.label_mappings().into_iter().collect();
        let raw_table = metrics
            .filter_metrics(def_id)?
            .iter()
            .map(Self::parse_row)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Rendered object info: {} rows", raw_table.len());
        Ok(Self { raw_table, label_mappings })
    }

    fn parse_row(row: &MetricValue) -> Result<RenderedObject, DatasetError> {
        let field = |key: &str| {
            row.get_u64(key)
                .ok_or_else(|| DatasetError::Malformed(format!("rendered object info row without '{key}': {:?}", row.fields)))
        };

        Ok(RenderedObject {
            capture_id: row
                .capture_id
                .clone()
                .ok_or_else(|| DatasetError::Malformed("rendered object info row without capture id".to_string()))?,
            label_id: field(LABEL)?,
            instance_id: field(INSTANCE)?,
            visible_pixels: field(VALUE_COLUMN)?,
        })
    }

    pub fn raw_table(&self) -> &[RenderedObject] {
        &self.raw_table
    }

    pub fn label_mappings(&self) -> &BTreeMap<u64, String> {
        &self.label_mappings
    }

    pub fn num_captures(&self) -> usize {
        self.raw_table
            .iter()
            .map(|row| row.capture_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of rendered objects per label, ascending by label id.
    pub fn total_counts(&self) -> Vec<LabelCount> {
        let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
        for row in &self.raw_table {
            *counts.entry(row.label_id).or_default() += 1;
        }

        counts
            .into_iter()
            .map(|(label_id, count)| LabelCount {
                label_id,
                label_name: label_name(&self.label_mappings, label_id),
                count,
            })
            .collect()
    }

    /// Number of rendered objects per capture, ascending by capture id.
    pub fn per_capture_counts(&self) -> Vec<CaptureCount> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for row in &self.raw_table {
            *counts.entry(row.capture_id.as_str()).or_default() += 1;
        }

        counts
            .into_iter()
            .map(|(capture_id, count)| CaptureCount {
                capture_id: capture_id.to_string(),
                count,
            })
            .collect()
    }

    pub fn visible_pixels(&self) -> Vec<f64> {
        self.raw_table.iter().map(|row| row.visible_pixels as f64).collect()
    }
}

fn label_name(mappings: &BTreeMap<u64, String>, label_id: u64) -> String {
    mappings
        .get(&label_id)
        .cloned()
        .unwrap_or_else(|| format!("Unknown ({label_id})"))
}

/// Sums an object count metric (`label_id`, `label_name`, `count`) over all captures.
///
/// Names come from `mappings` first, then from the rows themselves.
pub fn object_counts(values: &[MetricValue], mappings: &BTreeMap<u64, String>) -> Vec<LabelCount> {
    let mut totals: BTreeMap<u64, (Option<String>, u64)> = BTreeMap::new();
    let mut skipped = 0;

    for value in values {
        let (Some(label_id), Some(count)) = (value.get_u64(LABEL), value.get_u64(COUNT_COLUMN)) else {
            skipped += 1;
            continue;
        };
        let entry = totals.entry(label_id).or_insert((None, 0));
        if entry.0.is_none() {
            entry.0 = value.get_str(LABEL_READABLE).map(str::to_string);
        }
        entry.1 += count;
    }

    if skipped > 0 {
        warn!("Skipped {} object count row(s) without label_id/count", skipped);
    }

    totals
        .into_iter()
        .map(|(label_id, (row_name, count))| LabelCount {
            label_id,
            label_name: mappings
                .get(&label_id)
                .cloned()
                .or(row_name)
                .unwrap_or_else(|| format!("Unknown ({label_id})")),
            count,
        })
        .collect()
}

/// Numeric values of `key`; rows where it is missing or not a number are skipped.
pub fn metric_column(values: &[MetricValue], key: &str) -> Vec<f64> {
    values.iter().filter_map(|value| value.get_f64(key)).collect()
}

/// Summary statistics matching pandas `describe()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN for a single value
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// `None` when `values` is empty. NaN inputs are ignored.
pub fn describe(values: &[f64]) -> Option<Summary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        f64::NAN
    };

    Some(Summary {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "count  {}", self.count)?;
        writeln!(f, "mean   {:.3}", self.mean)?;
        writeln!(f, "std    {:.3}", self.std)?;
        writeln!(f, "min    {:.3}", self.min)?;
        writeln!(f, "25%    {:.3}", self.q25)?;
        writeln!(f, "50%    {:.3}", self.median)?;
        writeln!(f, "75%    {:.3}", self.q75)?;
        write!(f, "max    {:.3}", self.max)
    }
}
