//! Viewport tracking: the "virtual camera".
//!
//! Turns per-frame motion into a smooth, in-bounds trajectory for a
//! fixed-size viewport.
//!
//! # Algorithm
//!
//! Starting from the frame center, for each frame in order:
//!
//! 1. **Aim**: aggregate the frame's motion boxes into a region of interest.
//! 2. **Smooth**: `next = a * roi_center + (1 - a) * prev`, truncated per axis.
//! 3. **Clamp**: keep the viewport rectangle inside the frame.
//!
//! The clamped center becomes `prev` for the next frame, so the pass is
//! strictly sequential within one sequence.

use serde::{Deserialize, Serialize};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::frame::{Frame, FrameDimensions};
use reframe_frame_model::geometry::{MotionBoxSet, RegionOfInterest};
use reframe_frame_model::viewport::{ViewportPosition, ViewportSize};

use crate::roi::aggregate;

/// Configuration for the viewport tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Fixed viewport size for the whole sequence.
    pub viewport: ViewportSize,

    /// Weight of the current ROI against the previous center, in (0, 1].
    /// Higher follows motion faster; lower is steadier.
    pub smoothing_factor: f64,
}

impl TrackerConfig {
    pub fn new(viewport: ViewportSize, smoothing_factor: f64) -> Self {
        Self {
            viewport,
            smoothing_factor,
        }
    }

    pub fn validate(&self) -> ReframeResult<()> {
        let factor = self.smoothing_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ReframeError::invalid_input(format!(
                "smoothing_factor must be in (0, 1], got {factor}"
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ReframeError::invalid_input(format!(
                "viewport {} must be non-empty",
                self.viewport
            )));
        }
        Ok(())
    }
}

/// Sequential viewport tracker.
///
/// Holds only configuration; the running center is threaded through each
/// call, so one tracker can serve any number of independent sequences.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    config: TrackerConfig,
}

impl ViewportTracker {
    /// Create a tracker, rejecting out-of-range parameters.
    pub fn new(config: TrackerConfig) -> ReframeResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Track a frame sequence. Frames are read for their dimensions only.
    pub fn track(
        &self,
        frames: &[Frame],
        motion: &[MotionBoxSet],
    ) -> ReframeResult<Vec<ViewportPosition>> {
        if frames.len() != motion.len() {
            return Err(ReframeError::invalid_input(format!(
                "{} frames but {} motion box sets",
                frames.len(),
                motion.len()
            )));
        }

        let Some(first) = frames.first() else {
            return Ok(vec![]);
        };
        let dims = FrameDimensions::of(first);
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| FrameDimensions::of(f) != dims)
        {
            return Err(ReframeError::invalid_input(format!(
                "frame {index} is {} but frame 0 is {dims}",
                FrameDimensions::of(frame)
            )));
        }

        self.track_dimensions(dims, motion)
    }

    /// Track motion sets for frames of known dimensions, starting centered.
    pub fn track_dimensions(
        &self,
        dims: FrameDimensions,
        motion: &[MotionBoxSet],
    ) -> ReframeResult<Vec<ViewportPosition>> {
        if motion.is_empty() {
            return Ok(vec![]);
        }
        self.track_from(ViewportPosition::frame_center(dims), dims, motion)
    }

    /// Track motion sets starting from an arbitrary previous center.
    pub fn track_from(
        &self,
        initial: ViewportPosition,
        dims: FrameDimensions,
        motion: &[MotionBoxSet],
    ) -> ReframeResult<Vec<ViewportPosition>> {
        if !self.config.viewport.fits_within(dims) {
            return Err(ReframeError::invalid_input(format!(
                "viewport {} does not fit frames of {dims}",
                self.config.viewport
            )));
        }

        let positions: Vec<ViewportPosition> = motion
            .iter()
            .scan(initial, |prev, boxes| {
                let roi = aggregate(boxes.boxes(), dims.width, dims.height);
                let next = self.step(*prev, roi, dims);
                *prev = next;
                Some(next)
            })
            .collect();

        tracing::debug!(
            frames = positions.len(),
            viewport = %self.config.viewport,
            smoothing = self.config.smoothing_factor,
            "viewport tracked"
        );

        Ok(positions)
    }

    /// One filter step: smooth toward the ROI, then clamp into the frame.
    pub fn step(
        &self,
        prev: ViewportPosition,
        roi: RegionOfInterest,
        dims: FrameDimensions,
    ) -> ViewportPosition {
        smooth_toward(prev, roi.center(), self.config.smoothing_factor)
            .clamp_into(self.config.viewport, dims)
    }
}

/// Exponential smoothing of `prev` toward `target`, truncated per axis.
pub fn smooth_toward(prev: ViewportPosition, target: (u32, u32), factor: f64) -> ViewportPosition {
    let axis = |target: u32, prev: u32| {
        (factor * target as f64 + (1.0 - factor) * prev as f64) as u32
    };
    ViewportPosition::new(axis(target.0, prev.x), axis(target.1, prev.y))
}

/// Track a frame sequence with explicit parameters.
pub fn track(
    frames: &[Frame],
    motion: &[MotionBoxSet],
    viewport: ViewportSize,
    smoothing_factor: f64,
) -> ReframeResult<Vec<ViewportPosition>> {
    ViewportTracker::new(TrackerConfig::new(viewport, smoothing_factor))?.track(frames, motion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reframe_frame_model::geometry::MotionBox;

    const HD: FrameDimensions = FrameDimensions {
        width: 1280,
        height: 720,
    };

    fn tracker(factor: f64) -> ViewportTracker {
        ViewportTracker::new(TrackerConfig::new(ViewportSize::new(640, 360), factor)).unwrap()
    }

    fn motion_at(cx: u32, cy: u32) -> MotionBoxSet {
        MotionBoxSet::from_unsorted(vec![MotionBox::new(cx - 50, cy - 50, 100, 100)])
    }

    #[test]
    fn test_empty_sequence_yields_empty_output() {
        let positions = track(&[], &[], ViewportSize::new(640, 360), 0.3).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn test_no_motion_holds_center() {
        let motion = vec![MotionBoxSet::empty(); 4];
        let positions = tracker(0.3).track_dimensions(HD, &motion).unwrap();
        assert_eq!(positions, vec![ViewportPosition::new(640, 360); 4]);
    }

    #[test]
    fn test_approaches_motion_without_overshoot() {
        let motion = vec![motion_at(500, 500); 3];
        let positions = tracker(0.3).track_dimensions(HD, &motion).unwrap();

        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0], ViewportPosition::new(598, 402));

        let mut prev = ViewportPosition::new(640, 360);
        for p in &positions {
            assert!(p.x < prev.x && p.x >= 500, "x went {} -> {}", prev.x, p.x);
            assert!(p.y > prev.y && p.y <= 500, "y went {} -> {}", prev.y, p.y);
            prev = *p;
        }
    }

    #[test]
    fn test_factor_one_jumps_to_roi_then_clamps() {
        let motion = vec![motion_at(100, 100)];
        let positions = tracker(1.0).track_dimensions(HD, &motion).unwrap();
        assert_eq!(positions, vec![ViewportPosition::new(320, 180)]);
    }

    #[test]
    fn test_track_from_custom_start() {
        let motion = vec![MotionBoxSet::empty()];
        let positions = tracker(0.5)
            .track_from(ViewportPosition::new(900, 200), HD, &motion)
            .unwrap();
        // 0.5 * 640 + 0.5 * 900 = 770, 0.5 * 360 + 0.5 * 200 = 280
        assert_eq!(positions, vec![ViewportPosition::new(770, 280)]);
    }

    #[test]
    fn test_length_mismatch_is_invalid_input() {
        let frames = vec![Frame::new(64, 64); 2];
        let motion = vec![MotionBoxSet::empty()];
        assert!(matches!(
            track(&frames, &motion, ViewportSize::new(32, 32), 0.3),
            Err(ReframeError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_mixed_frame_sizes_are_invalid_input() {
        let frames = vec![Frame::new(64, 64), Frame::new(64, 48)];
        let motion = vec![MotionBoxSet::empty(); 2];
        assert!(matches!(
            track(&frames, &motion, ViewportSize::new(32, 32), 0.3),
            Err(ReframeError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_oversized_viewport_is_invalid_input() {
        let frames = vec![Frame::new(64, 64)];
        let motion = vec![MotionBoxSet::empty()];
        assert!(track(&frames, &motion, ViewportSize::new(65, 32), 0.3).is_err());
    }

    #[test]
    fn test_out_of_range_factor_is_invalid_input() {
        for factor in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(
                ViewportTracker::new(TrackerConfig::new(ViewportSize::new(10, 10), factor))
                    .is_err(),
                "factor {factor} accepted"
            );
        }
    }

    #[test]
    fn test_tracking_is_deterministic() {
        let motion: Vec<MotionBoxSet> = (0..20)
            .map(|i| motion_at(100 + i * 50, 100 + (i * 37) % 500))
            .collect();
        let a = tracker(0.3).track_dimensions(HD, &motion).unwrap();
        let b = tracker(0.3).track_dimensions(HD, &motion).unwrap();
        assert_eq!(a, b);
    }

    fn arb_motion() -> impl Strategy<Value = MotionBoxSet> {
        prop::collection::vec((0u32..1180, 0u32..620, 1u32..100, 1u32..100), 0..4).prop_map(
            |raw| {
                raw.into_iter()
                    .map(|(x, y, w, h)| MotionBox::new(x, y, w, h))
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_positions_stay_contained(
            motion in prop::collection::vec(arb_motion(), 0..30),
            vw in 1u32..=1280,
            vh in 1u32..=720,
            factor in 0.01f64..=1.0,
        ) {
            let size = ViewportSize::new(vw, vh);
            let tracker = ViewportTracker::new(TrackerConfig::new(size, factor)).unwrap();
            let positions = tracker.track_dimensions(HD, &motion).unwrap();

            prop_assert_eq!(positions.len(), motion.len());
            for p in positions {
                prop_assert!(p.is_contained(size, HD));
            }
        }

        #[test]
        fn prop_smoothing_step_is_bounded(
            px in 0u32..1280, py in 0u32..720,
            tx in 0u32..1280, ty in 0u32..720,
            factor in 0.01f64..=1.0,
        ) {
            let prev = ViewportPosition::new(px, py);
            let next = smooth_toward(prev, (tx, ty), factor);

            // truncation may add at most one pixel beyond the exact step
            let dx = (next.x as f64 - px as f64).abs();
            let dy = (next.y as f64 - py as f64).abs();
            prop_assert!(dx <= factor * (tx as f64 - px as f64).abs() + 1.0);
            prop_assert!(dy <= factor * (ty as f64 - py as f64).abs() + 1.0);
        }
    }
}
