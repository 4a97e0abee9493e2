//! Render a report onto its frames: annotated overlays and viewport crops.

use std::path::PathBuf;

use anyhow::Context;

use reframe_frame_model::report::AnalysisReport;
use reframe_render_engine::export::{export_frames, ExportJob, ExportProgress};

use crate::frames;

pub async fn run(
    frames_dir: PathBuf,
    report_path: PathBuf,
    output: PathBuf,
    video: bool,
    label: bool,
) -> anyhow::Result<()> {
    println!("Rendering frames in: {}", frames_dir.display());

    let report = AnalysisReport::load(&report_path)
        .with_context(|| format!("Failed to load report {}", report_path.display()))?;

    let problems = report.validate();
    if !problems.is_empty() {
        for problem in &problems {
            println!("  ! {problem}");
        }
        anyhow::bail!("Report {} failed validation", report_path.display());
    }

    let frames = frames::load_frames(
        &frames_dir,
        report.source.frame_stride,
        report.source.dimensions,
    )?;

    println!("  Frames: {}", frames.len());
    println!("  Viewport: {}", report.tracking.viewport);
    println!("  Output: {}", output.display());

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
        );
    });

    let mut job = ExportJob::new(&output);
    job.encode_video = video;
    if !label {
        job.style.label_color = None;
    }

    let summary = export_frames(job, frames, report, Some(progress_cb)).await?;

    println!("\nRender complete: {} frames", summary.frames_written);
    if let Some(dir) = &summary.overlay_dir {
        println!("  Overlays: {}", dir.display());
    }
    if let Some(dir) = &summary.viewport_dir {
        println!("  Viewport crops: {}", dir.display());
    }
    for path in &summary.videos {
        println!("  Video: {}", path.display());
    }

    Ok(())
}
