//! Whole-sequence analysis: detection over consecutive pairs, then tracking.
//!
//! Frame 0 has no predecessor and always gets an empty motion set, so every
//! output stays index-aligned with the input frames.

use reframe_common::config::ReframeConfig;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::frame::{Frame, FrameDimensions};
use reframe_frame_model::geometry::MotionBoxSet;
use reframe_frame_model::report::{
    AnalysisReport, DetectionParams, SourceInfo, TrackingParams,
};
use reframe_frame_model::viewport::{ViewportPosition, ViewportSize};

use crate::motion::{MotionConfig, MotionDetector};
use crate::viewport_tracker::{TrackerConfig, ViewportTracker};

/// Parameters for one sequence analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceConfig {
    pub motion: MotionConfig,
    pub tracker: TrackerConfig,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            tracker: TrackerConfig::new(ViewportSize::new(640, 360), 0.3),
        }
    }
}

impl From<&ReframeConfig> for SequenceConfig {
    fn from(config: &ReframeConfig) -> Self {
        Self {
            motion: MotionConfig {
                threshold: config.detection.threshold,
                min_area: config.detection.min_area,
            },
            tracker: TrackerConfig::new(
                ViewportSize::new(
                    config.tracking.viewport_width,
                    config.tracking.viewport_height,
                ),
                config.tracking.smoothing_factor,
            ),
        }
    }
}

/// Index-aligned results for a frame sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceAnalysis {
    pub dimensions: FrameDimensions,
    pub motion: Vec<MotionBoxSet>,
    pub viewports: Vec<ViewportPosition>,
    config: SequenceConfig,
}

impl SequenceAnalysis {
    pub fn len(&self) -> usize {
        self.motion.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motion.is_empty()
    }

    /// Package the results as a persistable report.
    ///
    /// `sample_fps` and `frame_stride` describe how the frames were sampled
    /// from their source.
    pub fn into_report(
        self,
        source_path: impl Into<String>,
        sample_fps: f64,
        frame_stride: usize,
    ) -> ReframeResult<AnalysisReport> {
        AnalysisReport::new(
            SourceInfo {
                path: source_path.into(),
                dimensions: self.dimensions,
                sample_fps,
                frame_stride,
            },
            DetectionParams {
                threshold: self.config.motion.threshold,
                min_area: self.config.motion.min_area,
            },
            TrackingParams {
                viewport: self.config.tracker.viewport,
                smoothing_factor: self.config.tracker.smoothing_factor,
            },
            self.motion,
            self.viewports,
        )
        .map_err(|e| ReframeError::invalid_input(e.to_string()))
    }
}

/// Runs detection and tracking over a whole sequence.
#[derive(Debug, Clone)]
pub struct SequenceAnalyzer {
    config: SequenceConfig,
    detector: MotionDetector,
    tracker: ViewportTracker,
}

impl SequenceAnalyzer {
    pub fn new(config: SequenceConfig) -> ReframeResult<Self> {
        Ok(Self {
            config,
            detector: MotionDetector::new(config.motion)?,
            tracker: ViewportTracker::new(config.tracker)?,
        })
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    pub fn tracker(&self) -> &ViewportTracker {
        &self.tracker
    }

    /// Motion for every frame: empty for frame 0, then each consecutive pair.
    pub fn detect_all(&self, frames: &[Frame]) -> ReframeResult<Vec<MotionBoxSet>> {
        if frames.is_empty() {
            return Ok(vec![]);
        }

        let mut motion = Vec::with_capacity(frames.len());
        motion.push(MotionBoxSet::empty());
        for (i, pair) in frames.windows(2).enumerate() {
            motion.push(self.detector.detect_at(i + 1, &pair[0], &pair[1])?);
        }
        Ok(motion)
    }

    /// Detect then track. Empty input yields an empty analysis.
    pub fn analyze(&self, frames: &[Frame]) -> ReframeResult<SequenceAnalysis> {
        let dimensions = frames
            .first()
            .map(FrameDimensions::of)
            .unwrap_or_default();

        tracing::info!(
            frames = frames.len(),
            dimensions = %dimensions,
            threshold = self.config.motion.threshold,
            min_area = self.config.motion.min_area,
            "analyzing sequence"
        );

        let motion = self.detect_all(frames)?;
        let viewports = self.tracker.track(frames, &motion)?;

        let with_motion = motion.iter().filter(|m| !m.is_empty()).count();
        tracing::info!(
            frames = frames.len(),
            frames_with_motion = with_motion,
            "sequence analyzed"
        );

        Ok(SequenceAnalysis {
            dimensions,
            motion,
            viewports,
            config: self.config,
        })
    }

    /// Pair already-computed motion with tracking, for callers that run
    /// detection themselves (for example in parallel).
    pub fn assemble(
        &self,
        dimensions: FrameDimensions,
        motion: Vec<MotionBoxSet>,
    ) -> ReframeResult<SequenceAnalysis> {
        let viewports = self.tracker.track_dimensions(dimensions, &motion)?;
        Ok(SequenceAnalysis {
            dimensions,
            motion,
            viewports,
            config: self.config,
        })
    }
}

/// Analyze a frame sequence with the given parameters.
pub fn analyze_sequence(frames: &[Frame], config: SequenceConfig) -> ReframeResult<SequenceAnalysis> {
    SequenceAnalyzer::new(config)?.analyze(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame_with_square(x: u32, y: u32) -> Frame {
        let mut frame = Frame::new(160, 120);
        for py in y..y + 20 {
            for px in x..x + 20 {
                frame.put_pixel(px, py, Rgb([255, 255, 255]));
            }
        }
        frame
    }

    fn small_config() -> SequenceConfig {
        SequenceConfig {
            motion: MotionConfig::default(),
            tracker: TrackerConfig::new(ViewportSize::new(80, 60), 0.3),
        }
    }

    #[test]
    fn test_empty_sequence() {
        let analysis = analyze_sequence(&[], small_config()).unwrap();
        assert!(analysis.is_empty());
        assert!(analysis.viewports.is_empty());
    }

    #[test]
    fn test_single_frame_has_no_motion() {
        let frames = vec![frame_with_square(10, 10)];
        let analysis = analyze_sequence(&frames, small_config()).unwrap();
        assert_eq!(analysis.len(), 1);
        assert!(analysis.motion[0].is_empty());
        assert_eq!(analysis.viewports, vec![ViewportPosition::new(80, 60)]);
    }

    #[test]
    fn test_outputs_are_index_aligned() {
        let frames: Vec<Frame> = (0..4).map(|i| frame_with_square(10 + i * 25, 40)).collect();
        let analysis = analyze_sequence(&frames, small_config()).unwrap();

        assert_eq!(analysis.motion.len(), 4);
        assert_eq!(analysis.viewports.len(), 4);
        assert!(analysis.motion[0].is_empty());
        assert!(analysis.motion[1..].iter().all(|m| !m.is_empty()));
    }

    #[test]
    fn test_mismatched_frames_are_rejected() {
        let frames = vec![Frame::new(160, 120), Frame::new(80, 60)];
        assert!(matches!(
            analyze_sequence(&frames, small_config()),
            Err(ReframeError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_assemble_matches_analyze() {
        let frames: Vec<Frame> = (0..3).map(|i| frame_with_square(20 + i * 30, 50)).collect();
        let analyzer = SequenceAnalyzer::new(small_config()).unwrap();

        let direct = analyzer.analyze(&frames).unwrap();
        let motion = analyzer.detect_all(&frames).unwrap();
        let assembled = analyzer
            .assemble(FrameDimensions::of(&frames[0]), motion)
            .unwrap();

        assert_eq!(direct, assembled);
    }

    #[test]
    fn test_into_report_records_parameters() {
        let frames: Vec<Frame> = (0..2).map(|i| frame_with_square(20 + i * 40, 50)).collect();
        let report = analyze_sequence(&frames, small_config())
            .unwrap()
            .into_report("synthetic", 5.0, 1)
            .unwrap();

        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.source.dimensions, FrameDimensions::new(160, 120));
        assert_eq!(report.detection.threshold, 25);
        assert_eq!(report.tracking.viewport, ViewportSize::new(80, 60));
        assert!(report.validate().is_empty());
    }

    #[test]
    fn test_config_from_application_config() {
        let app = ReframeConfig::default();
        let config = SequenceConfig::from(&app);
        assert_eq!(config, SequenceConfig::default());
    }
}
