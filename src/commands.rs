//! CLI command implementations
//!
//! Each command is one pass: load the tables it needs, filter by definition
//! id, aggregate and write the result under the output directory. A missing
//! definition is reported and skipped where the command can do without it.
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use image::RgbImage;
use log::{debug, info, warn};

use crate::config::Config;
use crate::download;
use crate::file_io::{ensure_dir, get_filename, get_image_paths, load_rgb_image, resolve_data_file};
use crate::perception::definitions::{BOUNDING_BOX, OBJECT_COUNT, RENDERED_OBJECT_INFO, SEMANTIC_SEGMENTATION};
use crate::perception::{CaptureAnnotation, Captures, DatasetError, Definitions, MetricValue, Metrics};
use crate::plots::{self, BoxStyle, HistNorm, PlotOptions};
use crate::stats::{self, describe, RenderedObjectInfo};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// `Ok(None)` when the definition is missing, so callers can skip.
fn skip_missing<T>(result: Result<T, DatasetError>, what: &str) -> Result<Option<T>, DatasetError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_definition_missing() => {
            warn!("Skipping {}: {}", what, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn output_dir(out: &Option<PathBuf>, config: &Config) -> Result<PathBuf, String> {
    let dir = out.clone().unwrap_or_else(|| config.output_dir.clone());
    ensure_dir(&dir)?;
    Ok(dir)
}

fn box_style(config: &Config) -> BoxStyle {
    BoxStyle {
        line_width: config.box_line_width,
        font_scale: config.font_scale,
    }
}

fn print_summary(title: &str, values: &[f64]) {
    match describe(values) {
        Some(summary) => println!("{title}\n{summary}\n"),
        None => println!("{title}\n(no values)\n"),
    }
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Dataset archive URL
    #[arg(long)]
    pub url: String,

    /// Directory the archive is downloaded and extracted into
    #[arg(long)]
    pub dest: PathBuf,
}

pub fn download(args: &DownloadArgs) -> CommandResult {
    let archive = download::download_and_extract(&args.url, &args.dest)?;
    println!("Downloaded {}", archive.display());
    Ok(())
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[arg(long)]
    pub data_root: PathBuf,
}

pub fn summary(args: &SummaryArgs, config: &Config) -> CommandResult {
    let version = &config.dataset_version;
    let captures = Captures::load(&args.data_root, version)?;
    let annotation_definitions = Definitions::load_annotation_definitions(&args.data_root, version)?;
    let metrics = Metrics::load(&args.data_root, version)?;
    let metric_definitions = Definitions::load_metric_definitions(&args.data_root, version)?;

    if captures.is_empty() {
        warn!("{} has no captures", args.data_root.display());
    }
    let annotations: usize = captures.iter().map(|capture| capture.annotations.len()).sum();
    println!("Captures: {} ({} annotations)", captures.len(), annotations);
    println!("Metric records: {}", metrics.len());
    if metrics.is_empty() {
        warn!("{} has no metric records", args.data_root.display());
    }

    println!("Annotation definitions ({}):", annotation_definitions.len());
    for definition in annotation_definitions.iter() {
        println!("  {}  {}", definition.id, definition.name);
    }
    println!("Metric definitions ({}):", metric_definitions.len());
    for definition in metric_definitions.iter() {
        println!("  {}  {}", definition.id, definition.name);
    }

    let known = [
        ("bounding box", &annotation_definitions, BOUNDING_BOX),
        ("semantic segmentation", &annotation_definitions, SEMANTIC_SEGMENTATION),
        ("rendered object info", &metric_definitions, RENDERED_OBJECT_INFO),
        ("object count", &metric_definitions, OBJECT_COUNT),
    ];
    for (name, definitions, def_id) in known {
        let found = skip_missing(definitions.get_definition(def_id), name)?.is_some();
        println!("{:<24}{}", name, if found { "present" } else { "missing" });
    }

    Ok(())
}

#[derive(Args, Debug)]
pub struct ObjectsArgs {
    #[arg(long)]
    pub data_root: PathBuf,

    /// Rendered object info metric definition id
    #[arg(long, default_value = RENDERED_OBJECT_INFO)]
    pub def_id: String,

    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Histogram down-sampling threshold
    #[arg(long)]
    pub max_samples: Option<usize>,
}

pub fn objects(args: &ObjectsArgs, config: &Config) -> CommandResult {
    let loaded = RenderedObjectInfo::load(&args.data_root, &config.dataset_version, &args.def_id);
    let Some(info) = skip_missing(loaded, "rendered object info")? else {
        return Ok(());
    };

    let out = output_dir(&args.out, config)?;
    let max_samples = Some(args.max_samples.unwrap_or(config.max_samples));

    println!(
        "Rendered objects: {} in {} capture(s), {} known label(s)",
        info.raw_table().len(),
        info.num_captures(),
        info.label_mappings().len()
    );

    let totals = info.total_counts();
    let labels: Vec<String> = totals.iter().map(|c| c.label_name.clone()).collect();
    let counts: Vec<f64> = totals.iter().map(|c| c.count as f64).collect();
    print_summary("Objects per label", &counts);

    let per_capture: Vec<f64> = info.per_capture_counts().iter().map(|c| c.count as f64).collect();
    print_summary("Objects per capture", &per_capture);

    let pixels = info.visible_pixels();
    print_summary("Visible pixels per object", &pixels);

    let options = PlotOptions {
        x_tickangle: 90,
        ..PlotOptions::titled("Total object counts per label", config.plot_size).axes("label", "count")
    };
    plots::bar_plot(&labels, &counts, &options, &out.join("total_counts.png"))?;

    plots::histogram_plot(
        &per_capture,
        config.histogram_bins,
        max_samples,
        config.sample_seed,
        HistNorm::Count,
        &PlotOptions::titled("Objects per capture", config.plot_size).axes("objects in capture", "captures"),
        &out.join("per_capture_counts.png"),
    )?;

    plots::histogram_plot(
        &pixels,
        config.histogram_bins,
        max_samples,
        config.sample_seed,
        HistNorm::Count,
        &PlotOptions::titled("Visible pixels per object", config.plot_size).axes("visible pixels", "objects"),
        &out.join("visible_pixels.png"),
    )?;

    info!("Rendered object info plots written to {}", out.display());
    Ok(())
}

#[derive(Args, Debug)]
pub struct ObjectCountArgs {
    #[arg(long)]
    pub data_root: PathBuf,

    #[arg(long, default_value = OBJECT_COUNT)]
    pub def_id: String,

    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn object_count(args: &ObjectCountArgs, config: &Config) -> CommandResult {
    let version = &config.dataset_version;
    let metrics = Metrics::load(&args.data_root, version)?;
    let Some(rows) = skip_missing(metrics.filter_metrics(&args.def_id), "object count")? else {
        return Ok(());
    };

    let definitions = Definitions::load_metric_definitions(&args.data_root, version)?;
    let mappings: BTreeMap<u64, String> = skip_missing(definitions.get_definition(&args.def_id), "object count labels")?
        .map(|definition| definition.label_mappings().into_iter().collect())
        .unwrap_or_default();

    let counts = stats::object_counts(&rows, &mappings);
    for count in &counts {
        println!("{:>6}  {:<32}{}", count.label_id, count.label_name, count.count);
    }

    let out = output_dir(&args.out, config)?;
    let labels: Vec<String> = counts.iter().map(|c| c.label_name.clone()).collect();
    let values: Vec<f64> = counts.iter().map(|c| c.count as f64).collect();
    let options = PlotOptions {
        x_tickangle: 90,
        ..PlotOptions::titled("Object counts", config.plot_size).axes("label", "count")
    };
    plots::bar_plot(&labels, &values, &options, &out.join("object_counts.png"))?;
    Ok(())
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum NormArg {
    Count,
    Probability,
    Density,
}

impl From<NormArg> for HistNorm {
    fn from(norm: NormArg) -> Self {
        match norm {
            NormArg::Count => HistNorm::Count,
            NormArg::Probability => HistNorm::Probability,
            NormArg::Density => HistNorm::ProbabilityDensity,
        }
    }
}

#[derive(Args, Debug)]
pub struct HistogramArgs {
    #[arg(long)]
    pub data_root: PathBuf,

    /// Metric definition id
    #[arg(long)]
    pub def_id: String,

    /// Metric value field to plot
    #[arg(long)]
    pub column: String,

    #[arg(long)]
    pub bins: Option<usize>,

    #[arg(long, value_enum, default_value_t = NormArg::Count)]
    pub norm: NormArg,

    #[arg(long)]
    pub max_samples: Option<usize>,

    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn histogram(args: &HistogramArgs, config: &Config) -> CommandResult {
    let metrics = Metrics::load(&args.data_root, &config.dataset_version)?;
    let rows = metrics.filter_metrics(&args.def_id)?;
    let values = stats::metric_column(&rows, &args.column);
    print_summary(&args.column, &values);

    let out = output_dir(&args.out, config)?;
    let options = PlotOptions {
        x_title: Some(args.column.clone()),
        ..PlotOptions::titled(&format!("{} distribution", args.column), config.plot_size)
    };
    plots::histogram_plot(
        &values,
        args.bins.unwrap_or(config.histogram_bins),
        Some(args.max_samples.unwrap_or(config.max_samples)),
        config.sample_seed,
        args.norm.into(),
        &options,
        &out.join(format!("{}_histogram.png", args.column)),
    )?;
    Ok(())
}

#[derive(Args, Debug)]
pub struct RotationArgs {
    #[arg(long)]
    pub data_root: PathBuf,

    #[arg(long)]
    pub def_id: String,

    /// Field holding the x rotation in degrees
    #[arg(long, default_value = "x_rotation")]
    pub x: String,

    #[arg(long, default_value = "y_rotation")]
    pub y: String,

    /// Optional field holding the z rotation
    #[arg(long)]
    pub z: Option<String>,

    #[arg(long)]
    pub max_samples: Option<usize>,

    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// `(x, y, z)` angles of every row holding all requested fields.
fn rotation_rows(rows: &[MetricValue], x: &str, y: &str, z: Option<&str>) -> Vec<(f64, f64, Option<f64>)> {
    let angles: Vec<(f64, f64, Option<f64>)> = rows
        .iter()
        .filter_map(|row| {
            let z = match z {
                Some(key) => Some(row.get_f64(key)?),
                None => None,
            };
            Some((row.get_f64(x)?, row.get_f64(y)?, z))
        })
        .collect();

    let skipped = rows.len() - angles.len();
    if skipped > 0 {
        warn!("Skipped {} rotation row(s) missing '{}', '{}' or '{}'", skipped, x, y, z.unwrap_or("-"));
    }
    angles
}

pub fn rotation(args: &RotationArgs, config: &Config) -> CommandResult {
    let metrics = Metrics::load(&args.data_root, &config.dataset_version)?;
    let rows = rotation_rows(&metrics.filter_metrics(&args.def_id)?, &args.x, &args.y, args.z.as_deref());
    debug!("{} rotation rows", rows.len());

    let out = output_dir(&args.out, config)?;
    plots::rotation_plot(
        &rows,
        Some(args.max_samples.unwrap_or(config.max_samples)),
        config.sample_seed,
        &PlotOptions::titled("Rotation", config.plot_size),
        &out.join("rotation.png"),
    )?;
    Ok(())
}

/// The `index`-th capture annotated with `def_id`.
fn nth_annotation<'a>(captures: &'a Captures, def_id: &str, index: usize) -> Result<CaptureAnnotation<'a>, Box<dyn Error>> {
    let rows = captures.filter(def_id)?;
    let count = rows.len();
    rows.into_iter()
        .nth(index)
        .ok_or_else(|| format!("Index {index} is out of range, {count} capture(s) carry {def_id}").into())
}

#[derive(Args, Debug)]
pub struct BBoxesArgs {
    #[arg(long)]
    pub data_root: PathBuf,

    #[arg(long, default_value = BOUNDING_BOX)]
    pub def_id: String,

    /// Position among the captures carrying boxes
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn bboxes(args: &BBoxesArgs, config: &Config) -> CommandResult {
    let version = &config.dataset_version;
    let captures = Captures::load(&args.data_root, version)?;
    let row = nth_annotation(&captures, &args.def_id, args.index)?;

    let definitions = Definitions::load_annotation_definitions(&args.data_root, version)?;
    let mappings: BTreeMap<u64, String> = skip_missing(definitions.get_definition(&args.def_id), "box labels")?
        .map(|definition| definition.label_mappings().into_iter().collect())
        .unwrap_or_default();

    let image = load_rgb_image(&resolve_data_file(&args.data_root, &row.capture.filename)?)?;
    let boxes = row.bboxes()?;
    let drawn = plots::plot_bboxes(&image, &boxes, &mappings, None, &box_style(config))?;

    let out = output_dir(&args.out, config)?;
    let path = out.join(format!("bboxes_{}.png", row.capture.id));
    drawn.save(&path)?;
    println!("{} box(es) drawn to {}", boxes.len(), path.display());
    Ok(())
}

#[derive(Args, Debug)]
pub struct SegmentationArgs {
    #[arg(long)]
    pub data_root: PathBuf,

    #[arg(long, default_value = SEMANTIC_SEGMENTATION)]
    pub def_id: String,

    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Weight of the segmentation image
    #[arg(long)]
    pub alpha: Option<f32>,

    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn segmentation(args: &SegmentationArgs, config: &Config) -> CommandResult {
    let captures = Captures::load(&args.data_root, &config.dataset_version)?;
    let row = nth_annotation(&captures, &args.def_id, args.index)?;
    let segmentation_file = row
        .annotation
        .filename
        .as_deref()
        .ok_or_else(|| format!("Annotation {} has no segmentation image", row.annotation.id))?;

    let capture = load_rgb_image(&resolve_data_file(&args.data_root, &row.capture.filename)?)?;
    let mask = load_rgb_image(&resolve_data_file(&args.data_root, segmentation_file)?)?;
    let blended = plots::blend(&capture, &mask, args.alpha.unwrap_or(config.segmentation_alpha))?;

    let out = output_dir(&args.out, config)?;
    let path = out.join(format!("segmentation_{}.png", row.capture.id));
    blended.save(&path)?;
    println!("Segmentation blend written to {}", path.display());
    Ok(())
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Gray image of class ids
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = "cityscapes")]
    pub dataset: String,

    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn decode(args: &DecodeArgs, config: &Config) -> CommandResult {
    let mask = image::open(&args.input)?.to_luma8();
    let colored = plots::decode_segmap(&mask, &args.dataset)?;

    let stem = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("segmap");
    let out = output_dir(&args.out, config)?;
    let path = out.join(format!("{stem}_decoded.png"));
    colored.save(&path)?;
    println!("Decoded segmentation written to {}", path.display());
    Ok(())
}

#[derive(Args, Debug)]
pub struct GridArgs {
    /// Images in row-major order
    #[arg(long, num_args = 1.., required_unless_present = "dir")]
    pub images: Vec<PathBuf>,

    /// Use every image of this directory, in natural order, instead of `--images`
    #[arg(long, conflicts_with = "images")]
    pub dir: Option<PathBuf>,

    #[arg(long)]
    pub cols: usize,

    #[arg(long)]
    pub title: String,

    /// Cell size as WIDTHxHEIGHT; defaults to the first image's size
    #[arg(long, value_parser = parse_size)]
    pub cell: Option<(u32, u32)>,

    /// Folder for the titled grid; the untitled one goes to `<folder>_notitles`
    #[arg(long)]
    pub folder: Option<PathBuf>,
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = width.trim().parse().map_err(|e| format!("bad width '{width}': {e}"))?;
    let height = height.trim().parse().map_err(|e| format!("bad height '{height}': {e}"))?;
    Ok((width, height))
}

pub fn grid(args: &GridArgs, config: &Config) -> CommandResult {
    let paths = match &args.dir {
        Some(dir) => get_image_paths(dir),
        None => args.images.clone(),
    };
    if args.cols == 0 || paths.is_empty() || paths.len() % args.cols != 0 {
        return Err(format!("{} image(s) do not fill rows of {}", paths.len(), args.cols).into());
    }

    let images = paths
        .iter()
        .map(|path| load_rgb_image(path))
        .collect::<Result<Vec<RgbImage>, String>>()?;
    let cell = match args.cell {
        Some(cell) => cell,
        None => images.first().map(RgbImage::dimensions).ok_or("No images given")?,
    };
    let rows: Vec<Vec<RgbImage>> = images.chunks(args.cols).map(<[RgbImage]>::to_vec).collect();

    let folder = args.folder.clone().unwrap_or_else(|| config.output_dir.join("sim2real"));
    let (titled, plain) = plots::save_grid(&rows, cell, &args.title, &folder)?;
    println!(
        "Grid written to {} and {}",
        titled.display(),
        get_filename(&plain).unwrap_or_default()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::fixtures::{write_dataset, IMAGE_SIZE, RGB_COLOR, ROTATION_DEF, SEGMENTATION_COLOR, VERSION};
    use crate::plots::charts::PlotError;
    use crate::settings::UserSettings;
    use image::{GrayImage, Luma, Rgb};
    use std::path::Path;

    fn test_config(out: &Path) -> Config {
        let mut config = Config::from_settings(&UserSettings::default());
        config.output_dir = out.to_path_buf();
        config
    }

    #[test]
    fn test_bboxes_writes_overlay() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let out = dir.path().join("out");
        let args = BBoxesArgs { data_root: dir.path().to_path_buf(), def_id: BOUNDING_BOX.to_string(), index: 0, out: None };

        bboxes(&args, &test_config(&out)).unwrap();

        let drawn = image::open(out.join("bboxes_capture-a.png")).unwrap().to_rgb8();
        assert_eq!(drawn.dimensions(), IMAGE_SIZE);
        assert_ne!(*drawn.get_pixel(2, 10), RGB_COLOR);
        assert_eq!(*drawn.get_pixel(60, 45), RGB_COLOR);
    }

    #[test]
    fn test_bboxes_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let args = BBoxesArgs { data_root: dir.path().to_path_buf(), def_id: BOUNDING_BOX.to_string(), index: 3, out: None };

        let err = bboxes(&args, &test_config(&dir.path().join("out"))).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_segmentation_blend() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let out = dir.path().join("out");
        let args = SegmentationArgs {
            data_root: dir.path().to_path_buf(),
            def_id: SEMANTIC_SEGMENTATION.to_string(),
            index: 0,
            alpha: Some(0.5),
            out: None,
        };

        segmentation(&args, &test_config(&out)).unwrap();

        let blended = image::open(out.join("segmentation_capture-a.png")).unwrap().to_rgb8();
        let expected = |a: u8, b: u8| ((a as f32 + b as f32) / 2.0).round() as u8;
        assert_eq!(
            *blended.get_pixel(0, 0),
            Rgb([
                expected(RGB_COLOR[0], SEGMENTATION_COLOR[0]),
                expected(RGB_COLOR[1], SEGMENTATION_COLOR[1]),
                expected(RGB_COLOR[2], SEGMENTATION_COLOR[2]),
            ])
        );
    }

    #[test]
    fn test_objects_skips_missing_definition() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let out = dir.path().join("out");
        let args = ObjectsArgs {
            data_root: dir.path().to_path_buf(),
            def_id: "missing-definition".to_string(),
            out: None,
            max_samples: None,
        };

        objects(&args, &test_config(&out)).unwrap();
        assert!(!out.exists());
    }

    /// Chart rendering needs a system font; without one only the drawing steps may fail.
    fn assert_chart_written(result: CommandResult, path: &Path) {
        match result {
            Ok(()) => assert!(path.exists(), "{} not written", path.display()),
            Err(e) => match e.downcast_ref::<PlotError>() {
                Some(PlotError::InvalidData(msg)) => panic!("invalid chart data: {msg}"),
                Some(_) => {}
                None => panic!("unexpected error: {e}"),
            },
        }
    }

    #[test]
    fn test_rotation_rows_skip_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let metrics = Metrics::load(dir.path(), VERSION).unwrap();
        let mut rows = metrics.filter_metrics(ROTATION_DEF).unwrap();

        let mut partial = rows[0].clone();
        partial.capture_id = Some("capture-d".to_string());
        partial.fields.remove("z_rotation");
        rows.push(partial);

        let planar = rotation_rows(&rows, "x_rotation", "y_rotation", None);
        assert_eq!(planar.len(), 4);
        assert!(planar.iter().all(|(_, _, z)| z.is_none()));

        let full = rotation_rows(&rows, "x_rotation", "y_rotation", Some("z_rotation"));
        assert_eq!(full, vec![(0.0, 0.0, Some(0.0)), (90.0, 0.0, Some(0.0)), (0.0, 90.0, Some(45.0))]);

        assert!(rotation_rows(&rows, "pitch", "y_rotation", None).is_empty());
    }

    #[test]
    fn test_rotation_writes_chart() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let out = dir.path().join("out");
        let args = RotationArgs {
            data_root: dir.path().to_path_buf(),
            def_id: ROTATION_DEF.to_string(),
            x: "x_rotation".to_string(),
            y: "y_rotation".to_string(),
            z: Some("z_rotation".to_string()),
            max_samples: None,
            out: None,
        };

        assert_chart_written(rotation(&args, &test_config(&out)), &out.join("rotation.png"));
    }

    #[test]
    fn test_objects_writes_charts() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let out = dir.path().join("out");
        let args = ObjectsArgs {
            data_root: dir.path().to_path_buf(),
            def_id: RENDERED_OBJECT_INFO.to_string(),
            out: None,
            max_samples: None,
        };

        assert_chart_written(objects(&args, &test_config(&out)), &out.join("total_counts.png"));
    }

    #[test]
    fn test_object_count_skips_missing_definition() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let args = ObjectCountArgs {
            data_root: dir.path().to_path_buf(),
            def_id: "missing-definition".to_string(),
            out: None,
        };
        assert!(object_count(&args, &test_config(&dir.path().join("out"))).is_ok());
    }

    #[test]
    fn test_summary_reports_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let args = SummaryArgs { data_root: dir.path().to_path_buf() };
        assert!(summary(&args, &test_config(&dir.path().join("out"))).is_ok());
    }

    #[test]
    fn test_summary_rejects_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let mut config = test_config(&dir.path().join("out"));
        config.dataset_version = "9.9.9".to_string();

        let err = summary(&SummaryArgs { data_root: dir.path().to_path_buf() }, &config).unwrap_err();
        assert!(err.to_string().contains("9.9.9"));
    }

    #[test]
    fn test_decode_colors_class_ids() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("labels.png");
        GrayImage::from_pixel(4, 4, Luma([13])).save(&input).unwrap();
        let out = dir.path().join("out");

        let args = DecodeArgs { input, dataset: "cityscapes".to_string(), out: None };
        decode(&args, &test_config(&out)).unwrap();

        let colored = image::open(out.join("labels_decoded.png")).unwrap().to_rgb8();
        assert_eq!(*colored.get_pixel(3, 3), Rgb([0, 0, 142]));
    }

    #[test]
    fn test_grid_command() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..4u8)
            .map(|i| {
                let path = dir.path().join(format!("img_{i}.png"));
                RgbImage::from_pixel(6, 4, Rgb([i * 50, 0, 0])).save(&path).unwrap();
                path
            })
            .collect();
        let folder = dir.path().join("grids");
        let args = GridArgs {
            images: paths.clone(),
            dir: None,
            cols: 2,
            title: "pairs".to_string(),
            cell: None,
            folder: Some(folder.clone()),
        };

        grid(&args, &test_config(dir.path())).unwrap();
        let plain = image::open(dir.path().join("grids_notitles").join("pairs.png")).unwrap().to_rgb8();
        assert_eq!(plain.dimensions(), (12, 8));
        assert_eq!(*plain.get_pixel(7, 5), Rgb([150, 0, 0]));

        let from_dir = GridArgs { images: vec![], dir: Some(dir.path().to_path_buf()), cols: 4, title: "row".to_string(), cell: Some((3, 2)), folder: Some(folder.clone()) };
        grid(&from_dir, &test_config(dir.path())).unwrap();
        let row = image::open(dir.path().join("grids_notitles").join("row.png")).unwrap().to_rgb8();
        assert_eq!(row.dimensions(), (12, 2));

        let uneven = GridArgs { images: paths[..3].to_vec(), dir: None, cols: 2, title: "x".to_string(), cell: None, folder: Some(folder) };
        assert!(grid(&uneven, &test_config(dir.path())).is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert!(parse_size("640").is_err());
        assert!(parse_size("ax4").is_err());
    }
}
