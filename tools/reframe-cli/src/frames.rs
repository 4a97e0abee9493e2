//! Image-sequence frame source.
//!
//! Reads a directory of still images in file-name order, keeps every n-th
//! image to approximate the target sample rate, and resizes each to the
//! analysis resolution.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::imageops::FilterType;

use reframe_common::config::SamplingDefaults;
use reframe_common::error::ReframeError;
use reframe_frame_model::frame::{Frame, FrameDimensions};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Keep every `round(source / target)`-th image, never fewer than one.
pub fn frame_stride(source_fps: f64, target_fps: f64) -> usize {
    if !(source_fps > 0.0 && target_fps > 0.0) {
        return 1;
    }
    ((source_fps / target_fps).round() as usize).max(1)
}

/// Image files in `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ReframeError::FileNotFound {
            path: dir.to_path_buf(),
        }
        .into());
    }

    let mut paths = vec![];
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read frames directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            paths.push(path);
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Load the sampled frames of a directory at the given resolution.
pub fn load_frames(
    dir: &Path,
    stride: usize,
    dims: FrameDimensions,
) -> anyhow::Result<Vec<Frame>> {
    let paths = list_images(dir)?;
    let stride = stride.max(1);

    tracing::info!(
        dir = %dir.display(),
        images = paths.len(),
        stride,
        resolution = %dims,
        "Loading frames"
    );

    paths
        .iter()
        .step_by(stride)
        .map(|path| load_frame(path, dims))
        .collect()
}

/// Load frames using the configured sampling parameters. Returns the frames
/// and the stride that was applied.
pub fn load_sampled(dir: &Path, sampling: &SamplingDefaults) -> anyhow::Result<(Vec<Frame>, usize)> {
    let stride = frame_stride(sampling.source_fps, sampling.target_fps);
    let frames = load_frames(
        dir,
        stride,
        FrameDimensions::new(sampling.width, sampling.height),
    )?;
    Ok((frames, stride))
}

fn load_frame(path: &Path, dims: FrameDimensions) -> anyhow::Result<Frame> {
    let frame = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .to_rgb8();

    if FrameDimensions::of(&frame) == dims {
        return Ok(frame);
    }
    Ok(image::imageops::resize(
        &frame,
        dims.width,
        dims.height,
        FilterType::Triangle,
    ))
}
