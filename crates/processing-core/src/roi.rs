//! Region-of-interest aggregation.
//!
//! Collapses a frame's motion boxes into the single rectangle the virtual
//! camera should aim at. Larger boxes pull harder, but smaller concurrent
//! motion still shifts the center.

use reframe_frame_model::frame::FrameDimensions;
use reframe_frame_model::geometry::{MotionBox, RegionOfInterest};

/// Fraction of the shorter frame side used for the default ROI size.
const DEFAULT_SIZE_DIVISOR: u32 = 6;

/// Aggregate motion boxes into one region of interest.
///
/// - No boxes: the frame center with a `min(width, height) / 6` square.
/// - Otherwise: area-weighted mean of box centers, sized by the plain mean of
///   box widths and heights. Zero total area falls back to the default.
pub fn aggregate(motion_boxes: &[MotionBox], frame_width: u32, frame_height: u32) -> RegionOfInterest {
    let dims = FrameDimensions::new(frame_width, frame_height);
    if motion_boxes.is_empty() {
        return default_region(dims);
    }

    let mut total_weight: u128 = 0;
    let mut weighted_x: u128 = 0;
    let mut weighted_y: u128 = 0;
    let mut total_width: u64 = 0;
    let mut total_height: u64 = 0;

    for b in motion_boxes {
        let (cx, cy) = b.center();
        let weight = b.area() as u128;
        weighted_x += cx as u128 * weight;
        weighted_y += cy as u128 * weight;
        total_weight += weight;
        total_width += b.width as u64;
        total_height += b.height as u64;
    }

    if total_weight == 0 {
        return default_region(dims);
    }

    let count = motion_boxes.len() as u64;
    RegionOfInterest::new(
        (weighted_x as f64 / total_weight as f64) as u32,
        (weighted_y as f64 / total_weight as f64) as u32,
        (total_width / count) as u32,
        (total_height / count) as u32,
    )
}

/// ROI used when a frame shows no usable motion.
pub fn default_region(dims: FrameDimensions) -> RegionOfInterest {
    let (cx, cy) = dims.center();
    let size = dims.min_side() / DEFAULT_SIZE_DIVISOR;
    RegionOfInterest::new(cx, cy, size, size)
}
