//! Motion detection: frame differencing to per-frame motion boxes.
//!
//! # Algorithm
//!
//! 1. **Luma**: drop color, motion is brightness change only.
//! 2. **Blur**: 21×21 Gaussian (auto sigma) on each frame to suppress sensor noise.
//! 3. **Difference**: per-pixel absolute difference of the blurred frames.
//! 4. **Threshold**: pixels whose difference exceeds `threshold` become foreground.
//! 5. **Dilate**: 5×5 square element, two passes, to merge nearby fragments.
//! 6. **Contours**: outermost borders of each connected foreground region.
//! 7. **Filter**: keep regions whose enclosed area exceeds `min_area`.
//! 8. **Sort**: bounding boxes by area, largest first.
//!
//! Detection is a pure function of the frame pair; calls for different pairs
//! can run concurrently.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors2;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::frame::{Frame, FrameDimensions};
use reframe_frame_model::geometry::{MotionBox, MotionBoxSet};

/// Side length of the Gaussian blur kernel.
pub const BLUR_KERNEL_SIZE: usize = 21;

/// Chebyshev radius of the dilation element (radius 2 is a 5×5 square).
pub const DILATION_RADIUS: u8 = 2;

/// Number of dilation passes.
pub const DILATION_ITERATIONS: usize = 2;

/// Configuration for the motion detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Brightness difference a pixel must exceed to count as motion.
    pub threshold: u8,

    /// Regions enclosing this many pixels or fewer are discarded.
    pub min_area: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            threshold: 25,
            min_area: 100,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> ReframeResult<()> {
        if self.min_area == 0 {
            return Err(ReframeError::invalid_input("min_area must be positive"));
        }
        Ok(())
    }
}

/// Stateless frame-pair motion detector.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    config: MotionConfig,
    blur_kernel: Vec<f32>,
}

impl MotionDetector {
    /// Create a detector, rejecting out-of-range parameters.
    pub fn new(config: MotionConfig) -> ReframeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            blur_kernel: gaussian_kernel(BLUR_KERNEL_SIZE),
        })
    }

    /// Create a detector with `threshold = 25`, `min_area = 100`.
    pub fn with_defaults() -> Self {
        Self {
            config: MotionConfig::default(),
            blur_kernel: gaussian_kernel(BLUR_KERNEL_SIZE),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Find motion between two frames.
    ///
    /// Equivalent to [`detect_at`](Self::detect_at) with frame index 0 in
    /// diagnostics.
    pub fn detect(&self, prev: &Frame, curr: &Frame) -> ReframeResult<MotionBoxSet> {
        self.detect_at(0, prev, curr)
    }

    /// Find motion between `prev` and `curr`, where `curr` sits at
    /// `frame_index` in its sequence.
    ///
    /// Mismatched or empty frames are `InvalidInput`. A failure inside the
    /// pipeline is logged and reported as no motion.
    pub fn detect_at(
        &self,
        frame_index: usize,
        prev: &Frame,
        curr: &Frame,
    ) -> ReframeResult<MotionBoxSet> {
        check_frame_pair(prev, curr)?;
        recover_detection(frame_index, self.find_motion(frame_index, prev, curr))
    }

    fn find_motion(
        &self,
        frame_index: usize,
        prev: &Frame,
        curr: &Frame,
    ) -> ReframeResult<MotionBoxSet> {
        let dims = FrameDimensions::of(curr);
        let prev_luma = self.smoothed_luma(prev);
        let curr_luma = self.smoothed_luma(curr);

        let mut mask = threshold_difference(&prev_luma, &curr_luma, self.config.threshold);
        for _ in 0..DILATION_ITERATIONS {
            mask = dilate(&mask, Norm::LInf, DILATION_RADIUS);
        }

        let mut boxes = vec![];
        for contour in find_contours::<i32>(&pad_mask(&mask))
            .iter()
            .filter(|c| is_external(c))
        {
            let points = unpad_points(&contour.points);
            if polygon_area(&points) <= self.config.min_area as f64 {
                continue;
            }

            let bbox = bounding_box(&points)
                .ok_or_else(|| ReframeError::detection(frame_index, "contour has no valid points"))?;
            if !bbox.fits_within(dims) {
                return Err(ReframeError::detection(
                    frame_index,
                    format!(
                        "contour box ({}, {}, {}, {}) exceeds frame {dims}",
                        bbox.x, bbox.y, bbox.width, bbox.height
                    ),
                ));
            }
            boxes.push(bbox);
        }

        Ok(MotionBoxSet::from_unsorted(boxes))
    }

    /// Grayscale then Gaussian blur.
    fn smoothed_luma(&self, frame: &Frame) -> GrayImage {
        let luma = image::imageops::grayscale(frame);
        separable_filter_equal(&luma, &self.blur_kernel)
    }
}

/// Detect motion between two frames with explicit parameters.
pub fn detect(
    prev: &Frame,
    curr: &Frame,
    threshold: u8,
    min_area: u32,
) -> ReframeResult<MotionBoxSet> {
    MotionDetector::new(MotionConfig {
        threshold,
        min_area,
    })?
    .detect(prev, curr)
}

/// Turn a recoverable pipeline failure into an empty motion set.
///
/// Only `Detection` faults are absorbed; every other error propagates.
fn recover_detection(
    frame_index: usize,
    result: ReframeResult<MotionBoxSet>,
) -> ReframeResult<MotionBoxSet> {
    match result {
        Ok(boxes) => {
            tracing::trace!(frame_index, boxes = boxes.len(), "motion detected");
            Ok(boxes)
        }
        Err(err) if err.is_recoverable() => {
            tracing::warn!(frame_index, error = %err, "motion detection failed, treating frame as still");
            Ok(MotionBoxSet::empty())
        }
        Err(err) => Err(err),
    }
}

fn check_frame_pair(prev: &Frame, curr: &Frame) -> ReframeResult<()> {
    let prev_dims = FrameDimensions::of(prev);
    let curr_dims = FrameDimensions::of(curr);

    if prev_dims != curr_dims {
        return Err(ReframeError::invalid_input(format!(
            "frame size mismatch: {prev_dims} vs {curr_dims}"
        )));
    }
    if curr_dims.is_empty() {
        return Err(ReframeError::invalid_input("frames are empty"));
    }
    Ok(())
}

/// Normalized 1-D Gaussian weights for an odd `size`.
///
/// Sigma follows the usual auto rule for a zero sigma:
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`, which is 3.5 for 21 taps.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Binary mask of `|a - b| > threshold` (255 = motion).
fn threshold_difference(a: &GrayImage, b: &GrayImage, threshold: u8) -> GrayImage {
    map_colors2(a, b, |p: Luma<u8>, q: Luma<u8>| {
        if p[0].abs_diff(q[0]) > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Surround the mask with a one-pixel background border.
///
/// The border follower only starts an outer border at a background-to-
/// foreground transition, so regions touching the frame edge need the
/// margin to be traced as outer borders at all.
fn pad_mask(mask: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);
    padded
}

/// Map border points of a padded mask back to frame coordinates.
fn unpad_points(points: &[Point<i32>]) -> Vec<Point<i32>> {
    points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect()
}

/// Outer borders that are not nested inside another region.
fn is_external(contour: &Contour<i32>) -> bool {
    matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
}

/// Shoelace area of the polygon traced by the border pixels.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// Inclusive bounding box of the border pixels.
fn bounding_box(points: &[Point<i32>]) -> Option<MotionBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    let to_u32 = |v: i32| u32::try_from(v).ok();
    Some(MotionBox::from_corners(
        (to_u32(min_x)?, to_u32(min_y)?),
        (to_u32(max_x)?, to_u32(max_y)?),
    ))
}
