mod build_info;
mod commands;
mod config;
mod download;
mod file_io;
mod logging;
mod perception;
mod plots;
mod settings;
mod stats;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::build_info::BuildInfo;
use crate::commands::CommandResult;
use crate::settings::UserSettings;

const APP_NAME: &str = "synthscope";

#[derive(Parser)]
#[command(name = "synthscope")]
#[command(about = "Statistics and visual checks for synthetic perception datasets")]
#[command(version = BuildInfo::build_string())]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Expected `version` of the dataset JSON files
    #[arg(long, global = true)]
    dataset_version: Option<String>,

    /// Write the buffered log to debug.log when the command finishes
    #[arg(long, global = true)]
    export_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a dataset archive and extract it
    Download(commands::DownloadArgs),
    /// Capture count and the definitions present in a dataset
    Summary(commands::SummaryArgs),
    /// Rendered object info statistics and plots
    Objects(commands::ObjectsArgs),
    /// Object counts summed per label
    ObjectCount(commands::ObjectCountArgs),
    /// Histogram of one metric field
    Histogram(commands::HistogramArgs),
    /// 3D scatter of Euler rotations
    Rotation(commands::RotationArgs),
    /// Draw the bounding boxes of one capture
    Bboxes(commands::BBoxesArgs),
    /// Blend a segmentation image over its capture
    Segmentation(commands::SegmentationArgs),
    /// Color a class-id image with a dataset palette
    Decode(commands::DecodeArgs),
    /// Tile images into a grid
    Grid(commands::GridArgs),
    /// Print the resolved settings, optionally writing them to the settings file
    Settings {
        #[arg(long)]
        write: bool,
    },
}

fn show_settings(path: Option<&std::path::Path>, write: bool) -> CommandResult {
    let settings = UserSettings::load(path);
    print!("{}", serde_yaml::to_string(&settings)?);

    if write {
        settings.save(path)?;
        let target = path.map(PathBuf::from).unwrap_or_else(UserSettings::settings_path);
        println!("Settings written to {}", target.display());
    }
    Ok(())
}

fn run(cli: &Cli) -> CommandResult {
    let mut config = config::init(cli.settings.as_deref()).clone();
    if let Some(version) = &cli.dataset_version {
        config.dataset_version = version.clone();
    }
    debug!("Output directory: {}", config.output_dir.display());

    match &cli.command {
        Commands::Download(args) => commands::download(args),
        Commands::Summary(args) => commands::summary(args, &config),
        Commands::Objects(args) => commands::objects(args, &config),
        Commands::ObjectCount(args) => commands::object_count(args, &config),
        Commands::Histogram(args) => commands::histogram(args, &config),
        Commands::Rotation(args) => commands::rotation(args, &config),
        Commands::Bboxes(args) => commands::bboxes(args, &config),
        Commands::Segmentation(args) => commands::segmentation(args, &config),
        Commands::Decode(args) => commands::decode(args, &config),
        Commands::Grid(args) => commands::grid(args, &config),
        Commands::Settings { write } => show_settings(cli.settings.as_deref(), *write),
    }
}

pub fn main() {
    let cli = Cli::parse();

    let shared_log_buffer = logging::setup_logger(APP_NAME);
    logging::setup_panic_hook(APP_NAME, Arc::clone(&shared_log_buffer));
    info!("{}", BuildInfo::detailed_info());

    let result = run(&cli);
    if let Err(e) = &result {
        error!("{}", e);
    }

    if cli.export_logs {
        match logging::export_debug_logs(APP_NAME, shared_log_buffer) {
            Ok(path) => println!("Debug log written to {}", path.display()),
            Err(e) => eprintln!("Failed to export debug logs: {}", e),
        }
    }

    if result.is_err() {
        std::process::exit(1);
    }
}
