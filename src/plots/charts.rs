//! Statistical charts
//!
//! Bar charts, histograms and 3D rotation scatter plots rendered with the
//! [`plotters`] bitmap backend. Every chart is written to a PNG file.

use std::path::Path;

use log::{debug, info};
use plotters::prelude::*;
use plotters::style::FontTransform;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Titles and size shared by every chart
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub title: Option<String>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    /// Tick label rotation in degrees; anything at or beyond 45 is drawn vertically
    pub x_tickangle: i32,
    pub size: (u32, u32),
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: None,
            x_title: None,
            y_title: None,
            x_tickangle: 0,
            size: (1200, 800),
        }
    }
}

impl PlotOptions {
    pub fn titled(title: &str, size: (u32, u32)) -> Self {
        Self {
            title: Some(title.to_string()),
            size,
            ..Self::default()
        }
    }

    pub fn axes(mut self, x_title: &str, y_title: &str) -> Self {
        self.x_title = Some(x_title.to_string());
        self.y_title = Some(y_title.to_string());
        self
    }
}

/// Histogram bar height normalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistNorm {
    #[default]
    Count,
    /// Fraction of all samples
    Probability,
    /// Fraction of all samples divided by the bin width
    ProbabilityDensity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Random subset of at most `max_samples` rows, keeping their original order.
pub fn sample_rows<T: Clone>(rows: &[T], max_samples: Option<usize>, seed: u64) -> Vec<T> {
    match max_samples {
        Some(max) if rows.len() > max => {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut indices = rand::seq::index::sample(&mut rng, rows.len(), max).into_vec();
            indices.sort_unstable();
            debug!("Sampled {} of {} rows", max, rows.len());
            indices.into_iter().map(|i| rows[i].clone()).collect()
        }
        _ => rows.to_vec(),
    }
}

/// Equal-width bins over the value range; the last bin includes the maximum.
///
/// NaN values are ignored. A constant input yields a single bin one unit wide.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![Bin { start: min - 0.5, end: max + 0.5, count: finite.len() }];
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for value in finite {
        let index = (((value - min) / width) as usize).min(bins - 1);
        result[index].count += 1;
    }

    result
}

fn normalised_heights(bins: &[Bin], norm: HistNorm) -> Vec<f64> {
    let total: usize = bins.iter().map(|bin| bin.count).sum();
    bins.iter()
        .map(|bin| match norm {
            HistNorm::Count => bin.count as f64,
            HistNorm::Probability => bin.count as f64 / total.max(1) as f64,
            HistNorm::ProbabilityDensity => {
                bin.count as f64 / (total.max(1) as f64 * (bin.end - bin.start))
            }
        })
        .collect()
}

fn tick_label_style(angle: i32) -> TextStyle<'static> {
    let font = ("sans-serif", 14.0).into_font();
    if angle.abs() >= 45 {
        font.transform(FontTransform::Rotate90).into()
    } else {
        font.into()
    }
}

/// Creates a bar chart with one bar per label and saves it as a PNG file
///
/// # Arguments
/// * `labels` - Category names along the x-axis
/// * `values` - Bar heights, same length as `labels`
/// * `options` - Title, axis titles, tick angle and size
/// * `output_path` - Path where the PNG file should be saved
pub fn bar_plot(labels: &[String], values: &[f64], options: &PlotOptions, output_path: &Path) -> Result<()> {
    if labels.is_empty() {
        return Err(PlotError::InvalidData("Bar plot needs at least one bar".to_string()));
    }
    if labels.len() != values.len() {
        return Err(PlotError::InvalidData(format!(
            "{} labels for {} values",
            labels.len(),
            values.len()
        )));
    }

    let root = BitMapBackend::new(output_path, options.size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let y_max = values.iter().copied().fold(0.0, f64::max).max(1.0) * 1.05;

    let mut chart = ChartBuilder::on(&root)
        .caption(options.title.as_deref().unwrap_or(""), ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(if options.x_tickangle.abs() >= 45 { 120 } else { 40 })
        .y_label_area_size(70)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0.0..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let label_formatter = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&label_formatter)
        .x_label_style(tick_label_style(options.x_tickangle))
        .x_desc(options.x_title.as_deref().unwrap_or(""))
        .y_desc(options.y_title.as_deref().unwrap_or(""))
        .draw()
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, value)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                BLUE.mix(0.7).filled(),
            );
            bar.set_margin(0, 0, 5, 5);
            bar
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    info!("Bar plot saved to {}", output_path.display());
    Ok(())
}

/// Creates a histogram of `values` and saves it as a PNG file
///
/// Values are randomly sampled down to `max_samples` (seeded) before binning.
pub fn histogram_plot(
    values: &[f64],
    bins: usize,
    max_samples: Option<usize>,
    seed: u64,
    norm: HistNorm,
    options: &PlotOptions,
    output_path: &Path,
) -> Result<()> {
    let sampled = sample_rows(values, max_samples, seed);
    let bins = histogram_bins(&sampled, bins);
    if bins.is_empty() {
        return Err(PlotError::InvalidData("Histogram needs at least one finite value".to_string()));
    }

    let heights = normalised_heights(&bins, norm);
    let x_min = bins[0].start;
    let x_max = bins[bins.len() - 1].end;
    let y_max = heights.iter().copied().fold(0.0, f64::max) * 1.05;
    let y_max = if y_max > 0.0 { y_max } else { 1.0 };

    let root = BitMapBackend::new(output_path, options.size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(options.title.as_deref().unwrap_or(""), ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let y_default = match norm {
        HistNorm::Count => "count",
        HistNorm::Probability => "probability",
        HistNorm::ProbabilityDensity => "probability density",
    };

    chart
        .configure_mesh()
        .x_desc(options.x_title.as_deref().unwrap_or(""))
        .y_desc(options.y_title.as_deref().unwrap_or(y_default))
        .x_label_style(tick_label_style(options.x_tickangle))
        .draw()
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .draw_series(bins.iter().zip(&heights).map(|(bin, height)| {
            Rectangle::new([(bin.start, 0.0), (bin.end, *height)], BLUE.mix(0.7).filled())
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    info!("Histogram of {} values saved to {}", sampled.len(), output_path.display());
    Ok(())
}

/// A unit vector rotated by one Euler triple, with its hover text
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub text: String,
}

fn rotate(matrix: [[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, value) in matrix.iter().zip(out.iter_mut()) {
        *value = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

/// Rotate (0, 1, 0) by `x`, then `y`, then optionally `z` (degrees).
///
/// `x` turns within the first two axes, `y` within the last two and `z`
/// within the first and last.
pub fn euler_to_point(x: f64, y: f64, z: Option<f64>) -> RotationPoint {
    let mut v = [0.0, 1.0, 0.0];

    let (sx, cx) = x.to_radians().sin_cos();
    v = rotate([[cx, -sx, 0.0], [sx, cx, 0.0], [0.0, 0.0, 1.0]], v);

    let (sy, cy) = y.to_radians().sin_cos();
    v = rotate([[1.0, 0.0, 0.0], [0.0, cy, -sy], [0.0, sy, cy]], v);

    let text = match z {
        Some(z) => {
            let (sz, cz) = z.to_radians().sin_cos();
            v = rotate([[cz, 0.0, sz], [0.0, 1.0, 0.0], [-sz, 0.0, cz]], v);
            format!("x: {x}°  y: {y}°  z: {z}°")
        }
        None => format!("x: {x}°  y: {y}°"),
    };

    RotationPoint { x: v[0], y: v[1], z: v[2], text }
}

/// Creates a 3D scatter of rotated unit vectors and saves it as a PNG file
///
/// # Arguments
/// * `rows` - Euler angles in degrees, `(x, y, optional z)`
/// * `max_samples` - Rows are randomly sampled down to this many
pub fn rotation_plot(
    rows: &[(f64, f64, Option<f64>)],
    max_samples: Option<usize>,
    seed: u64,
    options: &PlotOptions,
    output_path: &Path,
) -> Result<()> {
    let sampled = sample_rows(rows, max_samples, seed);
    if sampled.is_empty() {
        return Err(PlotError::InvalidData("Rotation plot needs at least one row".to_string()));
    }

    let points: Vec<RotationPoint> = sampled
        .iter()
        .map(|(x, y, z)| euler_to_point(*x, *y, *z))
        .collect();

    let root = BitMapBackend::new(output_path, options.size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(options.title.as_deref().unwrap_or(""), ("sans-serif", 30))
        .margin(20)
        .build_cartesian_3d(-1.0..1.0, -1.0..1.0, -1.0..1.0)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart.with_projection(|mut projection| {
        projection.yaw = 0.6;
        projection.pitch = 0.4;
        projection.scale = 0.8;
        projection.into_matrix()
    });

    chart
        .configure_axes()
        .draw()
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .draw_series(points.iter().map(|p| Circle::new((p.x, p.y, p.z), 4, BLUE.mix(0.5).filled())))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    info!("Rotation plot of {} points saved to {}", points.len(), output_path.display());
    Ok(())
}
