//! Export configuration and job management.

use std::path::{Path, PathBuf};
use std::process::Command;

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::frame::{Frame, FrameDimensions};
use reframe_frame_model::report::AnalysisReport;

use crate::compositor::{compute_compositions, crop_viewport, draw_overlay, OverlayStyle};

/// Subdirectory for annotated full frames.
pub const OVERLAY_DIR: &str = "frames";

/// Subdirectory for viewport crops.
pub const VIEWPORT_DIR: &str = "viewport";

/// Encoded video of the annotated frames.
pub const OVERLAY_VIDEO: &str = "motion_detection.mp4";

/// Encoded video of the viewport crops.
pub const VIEWPORT_VIDEO: &str = "viewport_tracking.mp4";

/// Video frame rate when the report records no usable sample rate.
pub const DEFAULT_VIDEO_FPS: f64 = 5.0;

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Directory that receives the output subdirectories.
    pub output_dir: PathBuf,

    /// Overlay colors and line width.
    pub style: OverlayStyle,

    /// Write annotated full frames.
    pub write_overlay: bool,

    /// Write viewport crops.
    pub write_viewport: bool,

    /// Also encode each written sequence to MP4 (requires ffmpeg).
    pub encode_video: bool,
}

impl ExportJob {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            style: OverlayStyle::default(),
            write_overlay: true,
            write_viewport: true,
            encode_video: false,
        }
    }

    pub fn overlay_dir(&self) -> PathBuf {
        self.output_dir.join(OVERLAY_DIR)
    }

    pub fn viewport_dir(&self) -> PathBuf {
        self.output_dir.join(VIEWPORT_DIR)
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Complete,
}

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub frames_written: usize,
    pub overlay_dir: Option<PathBuf>,
    pub viewport_dir: Option<PathBuf>,
    pub videos: Vec<PathBuf>,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Render every frame of the job.
    fn render(
        &mut self,
        job: &ExportJob,
        frames: &[Frame],
        report: &AnalysisReport,
        progress: Option<&ProgressCallback>,
    ) -> ReframeResult<ExportSummary>;

    /// Whether the backend can run on this system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Writes numbered PNG files.
#[derive(Debug, Default)]
pub struct PngSequenceBackend;

impl RenderBackend for PngSequenceBackend {
    fn render(
        &mut self,
        job: &ExportJob,
        frames: &[Frame],
        report: &AnalysisReport,
        progress: Option<&ProgressCallback>,
    ) -> ReframeResult<ExportSummary> {
        let overlay_dir = job.write_overlay.then(|| job.overlay_dir());
        let viewport_dir = job.write_viewport.then(|| job.viewport_dir());
        for dir in overlay_dir.iter().chain(viewport_dir.iter()) {
            std::fs::create_dir_all(dir)?;
        }

        let viewport = report.tracking.viewport;
        let total = frames.len() as u64;

        for (frame, composition) in frames.iter().zip(compute_compositions(report)) {
            let index = composition.frame_index;

            if let Some(dir) = &overlay_dir {
                let annotated = draw_overlay(frame, &composition, viewport, &job.style);
                annotated.save(numbered_path(dir, "frame", index))?;
            }

            if let Some(dir) = &viewport_dir {
                let crop = crop_viewport(frame, composition.viewport, viewport)?;
                crop.save(numbered_path(dir, "viewport", index))?;
            }

            if let Some(cb) = progress {
                let rendered = index as u64 + 1;
                cb(ExportProgress {
                    progress: rendered as f64 / total.max(1) as f64,
                    frames_rendered: rendered,
                    total_frames: total,
                    stage: ExportStage::Rendering,
                });
            }
        }

        Ok(ExportSummary {
            frames_written: frames.len(),
            overlay_dir,
            viewport_dir,
            videos: vec![],
        })
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "png-sequence"
    }
}

/// Writes the PNG sequences, then encodes each one to H.264 MP4 with the
/// ffmpeg CLI.
#[derive(Debug, Default)]
pub struct FfmpegBackend {
    frames: PngSequenceBackend,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        job: &ExportJob,
        frames: &[Frame],
        report: &AnalysisReport,
        progress: Option<&ProgressCallback>,
    ) -> ReframeResult<ExportSummary> {
        let mut summary = self.frames.render(job, frames, report, progress)?;
        if frames.is_empty() {
            return Ok(summary);
        }

        let fps = video_fps(report);
        let sequences = [
            (summary.overlay_dir.clone(), "frame", OVERLAY_VIDEO),
            (summary.viewport_dir.clone(), "viewport", VIEWPORT_VIDEO),
        ];
        for (dir, prefix, file_name) in sequences {
            let Some(dir) = dir else {
                continue;
            };
            let output = job.output_dir.join(file_name);
            let pattern = dir.join(format!("{prefix}_%04d.png"));
            run_ffmpeg(&encode_args(&pattern, fps, &output))?;
            tracing::info!(video = %output.display(), fps, "Encoded video");
            summary.videos.push(output);
        }

        Ok(summary)
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Render a report's results onto its frames.
///
/// This is the main entry point for rendering. Frames must be the same
/// sequence the report was produced from.
pub async fn export_frames(
    job: ExportJob,
    frames: Vec<Frame>,
    report: AnalysisReport,
    progress: Option<ProgressCallback>,
) -> ReframeResult<ExportSummary> {
    tracing::info!(
        output = %job.output_dir.display(),
        frames = frames.len(),
        "Starting export"
    );

    check_alignment(&frames, &report)?;

    if let Some(cb) = &progress {
        cb(ExportProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames: frames.len() as u64,
            stage: ExportStage::Preparing,
        });
    }

    let mut backend = select_backend(job.encode_video)?;

    let summary = tokio::task::spawn_blocking(move || {
        tracing::info!(backend = backend.name(), "Using render backend");
        let summary = backend.render(&job, &frames, &report, progress.as_ref())?;

        if let Some(cb) = &progress {
            cb(ExportProgress {
                progress: 1.0,
                frames_rendered: summary.frames_written as u64,
                total_frames: summary.frames_written as u64,
                stage: ExportStage::Complete,
            });
        }
        Ok::<_, ReframeError>(summary)
    })
    .await
    .map_err(|e| ReframeError::render(format!("Export task failed: {e}")))??;

    tracing::info!(frames = summary.frames_written, "Export complete");
    Ok(summary)
}

/// PNG output by default; ffmpeg when video is requested and installed.
fn select_backend(encode_video: bool) -> ReframeResult<Box<dyn RenderBackend>> {
    if !encode_video {
        return Ok(Box::new(PngSequenceBackend));
    }

    let backend = FfmpegBackend::new();
    if !backend.is_available() {
        return Err(ReframeError::render(
            "Video encoding requested but ffmpeg was not found in PATH",
        ));
    }
    Ok(Box::new(backend))
}

/// The report's sample rate, or [`DEFAULT_VIDEO_FPS`] if it has none.
fn video_fps(report: &AnalysisReport) -> f64 {
    let fps = report.source.sample_fps;
    if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        DEFAULT_VIDEO_FPS
    }
}

/// ffmpeg arguments encoding the numbered PNGs matching `pattern` into an
/// H.264 MP4 at `fps`. Odd frame sizes are padded to even for yuv420p.
fn encode_args(pattern: &Path, fps: f64, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-framerate".to_string(),
        fps.to_string(),
        "-start_number".to_string(),
        "0".to_string(),
        "-i".to_string(),
        pattern.display().to_string(),
        "-vf".to_string(),
        "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        output.display().to_string(),
    ]
}

fn run_ffmpeg(args: &[String]) -> ReframeResult<()> {
    tracing::debug!(args = ?args, "Running ffmpeg");
    let output = Command::new("ffmpeg")
        .args(args)
        .output()
        .map_err(|e| ReframeError::render(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReframeError::render(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Frames and report must describe the same sequence.
fn check_alignment(frames: &[Frame], report: &AnalysisReport) -> ReframeResult<()> {
    if frames.len() != report.frames.len() {
        return Err(ReframeError::invalid_input(format!(
            "{} frames but the report covers {}",
            frames.len(),
            report.frames.len()
        )));
    }

    let expected = report.source.dimensions;
    if let Some((index, frame)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| FrameDimensions::of(f) != expected)
    {
        return Err(ReframeError::invalid_input(format!(
            "frame {index} is {} but the report expects {expected}",
            FrameDimensions::of(frame)
        )));
    }

    if !report.tracking.viewport.fits_within(expected) {
        return Err(ReframeError::invalid_input(format!(
            "viewport {} does not fit frames of {expected}",
            report.tracking.viewport
        )));
    }

    Ok(())
}

/// `dir/prefix_NNNN.png`, zero-padded to four digits.
fn numbered_path(dir: &Path, prefix: &str, index: usize) -> PathBuf {
    dir.join(format!("{prefix}_{index:04}.png"))
}
