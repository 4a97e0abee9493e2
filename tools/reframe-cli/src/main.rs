//! Reframe CLI: command-line interface for motion analysis and rendering.
//!
//! Usage:
//!   reframe analyze <FRAMES_DIR>                   Detect motion and track the viewport
//!   reframe render <FRAMES_DIR> --report <PATH>    Write overlays and viewport crops (--video for MP4)
//!   reframe info <REPORT>                          Show report information

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reframe_common::config::ReframeConfig;
use reframe_frame_model::viewport::ViewportSize;

mod commands;
mod frames;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Motion-following virtual camera for fixed-camera footage",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect motion and track the viewport over an image sequence
    Analyze {
        /// Directory of frame images (png, jpg, bmp), read in name order
        frames_dir: PathBuf,

        /// Report output path (default: <FRAMES_DIR>/report.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Brightness difference that counts as motion [0, 255]
        #[arg(long)]
        threshold: Option<u8>,

        /// Minimum enclosed area of a motion region, in pixels
        #[arg(long)]
        min_area: Option<u32>,

        /// Viewport smoothing factor (0, 1]; higher follows faster
        #[arg(long)]
        smoothing: Option<f64>,

        /// Viewport size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<ViewportSize>,

        /// Frame rate of the source image sequence
        #[arg(long)]
        source_fps: Option<f64>,

        /// Frame rate to analyze at
        #[arg(long)]
        target_fps: Option<f64>,

        /// Analysis width
        #[arg(long)]
        width: Option<u32>,

        /// Analysis height
        #[arg(long)]
        height: Option<u32>,

        /// Parallel detection workers
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Render overlays and viewport crops from a report
    Render {
        /// Directory of frame images the report was produced from
        frames_dir: PathBuf,

        /// Analysis report path
        #[arg(short, long)]
        report: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "reframe-out")]
        output: PathBuf,

        /// Also encode motion_detection.mp4 and viewport_tracking.mp4 (requires ffmpeg)
        #[arg(long)]
        video: bool,

        /// Leave the frame-number label off the annotated frames
        #[arg(long)]
        no_label: bool,
    },

    /// Show report information
    Info {
        /// Path to the report
        path: PathBuf,

        /// Print the raw report JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_viewport(s: &str) -> Result<ViewportSize, String> {
    ViewportSize::parse(s).ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))
}

#[allow(clippy::too_many_arguments)]
fn apply_overrides(
    config: &mut ReframeConfig,
    threshold: Option<u8>,
    min_area: Option<u32>,
    smoothing: Option<f64>,
    viewport: Option<ViewportSize>,
    source_fps: Option<f64>,
    target_fps: Option<f64>,
    width: Option<u32>,
    height: Option<u32>,
) {
    if let Some(v) = threshold {
        config.detection.threshold = v;
    }
    if let Some(v) = min_area {
        config.detection.min_area = v;
    }
    if let Some(v) = smoothing {
        config.tracking.smoothing_factor = v;
    }
    if let Some(v) = viewport {
        config.tracking.viewport_width = v.width;
        config.tracking.viewport_height = v.height;
    }
    if let Some(v) = source_fps {
        config.sampling.source_fps = v;
    }
    if let Some(v) = target_fps {
        config.sampling.target_fps = v;
    }
    if let Some(v) = width {
        config.sampling.width = v;
    }
    if let Some(v) = height {
        config.sampling.height = v;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ReframeConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Analyze {
            frames_dir,
            output,
            threshold,
            min_area,
            smoothing,
            viewport,
            source_fps,
            target_fps,
            width,
            height,
            jobs,
        } => {
            apply_overrides(
                &mut config,
                threshold,
                min_area,
                smoothing,
                viewport,
                source_fps,
                target_fps,
                width,
                height,
            );
            config.validate()?;
            commands::analyze::run(frames_dir, output, config, jobs).await
        }
        Commands::Render {
            frames_dir,
            report,
            output,
            video,
            no_label,
        } => commands::render::run(frames_dir, report, output, video, !no_label).await,
        Commands::Info { path, json } => commands::info::run(path, json),
    }
}
