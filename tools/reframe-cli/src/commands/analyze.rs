//! Run motion detection and viewport tracking over an image sequence.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinSet;

use reframe_common::config::ReframeConfig;
use reframe_frame_model::frame::{Frame, FrameDimensions};
use reframe_frame_model::geometry::MotionBoxSet;
use reframe_processing_core::motion::MotionDetector;
use reframe_processing_core::sequence::{SequenceAnalysis, SequenceAnalyzer, SequenceConfig};

use crate::frames;

pub async fn run(
    frames_dir: PathBuf,
    output: Option<PathBuf>,
    config: ReframeConfig,
    jobs: usize,
) -> anyhow::Result<()> {
    println!("Analyzing frames in: {}", frames_dir.display());

    let (frames, stride) = frames::load_sampled(&frames_dir, &config.sampling)?;
    println!("  Loaded {} frames (every {stride} image)", frames.len());

    if frames.is_empty() {
        println!("  No frames to analyze.");
        return Ok(());
    }

    let analyzer = SequenceAnalyzer::new(SequenceConfig::from(&config))?;
    let analysis = analyze_parallel(&analyzer, frames, jobs).await?;

    let with_motion = analysis.motion.iter().filter(|m| !m.is_empty()).count();
    println!("  Motion found in {with_motion} of {} frames", analysis.len());

    let report = analysis.into_report(
        frames_dir.display().to_string(),
        config.sampling.target_fps,
        stride,
    )?;

    let output_path = output.unwrap_or_else(|| frames_dir.join("report.json"));
    report
        .save(&output_path)
        .with_context(|| format!("Failed to save report to {}", output_path.display()))?;

    println!("  Report saved to: {}", output_path.display());
    println!("\nAnalysis complete.");

    Ok(())
}

/// Detect motion on `jobs` blocking workers, then track sequentially.
///
/// Each worker takes a contiguous run of frame pairs; results are put back
/// in frame order before tracking, so the output matches a sequential run.
pub async fn analyze_parallel(
    analyzer: &SequenceAnalyzer,
    frames: Vec<Frame>,
    jobs: usize,
) -> anyhow::Result<SequenceAnalysis> {
    let Some(first) = frames.first() else {
        return Ok(analyzer.analyze(&[])?);
    };
    let dims = FrameDimensions::of(first);
    let total = frames.len();
    let pairs = total - 1;
    let jobs = jobs.clamp(1, pairs.max(1));
    let chunk = pairs.div_ceil(jobs).max(1);

    tracing::info!(frames = total, jobs, "Detecting motion");

    let frames = Arc::new(frames);
    let mut set = JoinSet::new();
    for start in (1..total).step_by(chunk) {
        let end = (start + chunk).min(total);
        let frames = Arc::clone(&frames);
        let detector: MotionDetector = analyzer.detector().clone();
        set.spawn_blocking(move || {
            (start..end)
                .map(|i| {
                    detector
                        .detect_at(i, &frames[i - 1], &frames[i])
                        .map(|boxes| (i, boxes))
                })
                .collect::<Result<Vec<_>, _>>()
        });
    }

    let mut motion = vec![MotionBoxSet::empty(); total];
    while let Some(result) = set.join_next().await {
        for (i, boxes) in result.context("Detection worker panicked")?? {
            motion[i] = boxes;
        }
    }

    Ok(analyzer.assemble(dims, motion)?)
}
