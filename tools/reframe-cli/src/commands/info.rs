//! Show analysis report information.

use std::path::PathBuf;

use anyhow::Context;

use reframe_frame_model::report::AnalysisReport;

pub fn run(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let report = AnalysisReport::load(&path)
        .with_context(|| format!("Failed to load report {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Report: {}", path.display());
    println!("  Version: {}", report.version);
    println!("  Created: {}", report.created_at);
    println!();

    println!("Source:");
    println!("  Path: {}", report.source.path);
    println!(
        "  Resolution: {} @ {}fps (every {} image)",
        report.source.dimensions, report.source.sample_fps, report.source.frame_stride
    );
    println!();

    println!("Parameters:");
    println!(
        "  Detection: threshold {}, min area {}",
        report.detection.threshold, report.detection.min_area
    );
    println!(
        "  Tracking: viewport {}, smoothing {}",
        report.tracking.viewport, report.tracking.smoothing_factor
    );
    println!();

    let boxes: usize = report.frames.iter().map(|f| f.motion_boxes.len()).sum();
    println!("Frames:");
    println!("  Total: {}", report.frames.len());
    println!("  With motion: {}", report.frames_with_motion());
    println!("  Motion boxes: {boxes}");

    if let (Some(first), Some(last)) = (report.frames.first(), report.frames.last()) {
        println!(
            "  Viewport path: ({}, {}) -> ({}, {})",
            first.viewport.x, first.viewport.y, last.viewport.x, last.viewport.y
        );
    }

    let problems = report.validate();
    if problems.is_empty() {
        println!("\nReport is valid.");
    } else {
        println!("\nValidation problems:");
        for problem in &problems {
            println!("  ! {problem}");
        }
    }

    Ok(())
}
