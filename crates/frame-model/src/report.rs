//! Analysis report: the persisted output of one detection + tracking run.
//!
//! The report is the hand-off to rendering. It carries the parameters that
//! produced it and one entry per input frame, index-aligned with the frame
//! sequence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::frame::FrameDimensions;
use crate::geometry::MotionBoxSet;
use crate::viewport::{ViewportPosition, ViewportSize};

/// Current report schema version.
pub const REPORT_VERSION: &str = "1.0";

/// Top-level report file (`report.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema version.
    pub version: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Where the frames came from and how they were sampled.
    pub source: SourceInfo,

    /// Parameters passed to motion detection.
    pub detection: DetectionParams,

    /// Parameters passed to viewport tracking.
    pub tracking: TrackingParams,

    /// Per-frame results, in frame order.
    pub frames: Vec<FrameAnalysis>,
}

/// Description of the analyzed frame sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Directory or file the frames were read from.
    #[serde(default)]
    pub path: String,

    /// Dimensions shared by every frame.
    pub dimensions: FrameDimensions,

    /// Frame rate the sequence was sampled at.
    #[serde(default)]
    pub sample_fps: f64,

    /// Every `frame_stride`-th source image was kept.
    #[serde(default = "default_stride")]
    pub frame_stride: usize,
}

fn default_stride() -> usize {
    1
}

/// Detection parameters recorded in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionParams {
    pub threshold: u8,
    pub min_area: u32,
}

/// Tracking parameters recorded in a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingParams {
    pub viewport: ViewportSize,
    pub smoothing_factor: f64,
}

/// Results for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Zero-based position in the sampled sequence.
    pub index: usize,

    /// Motion found between the previous frame and this one.
    pub motion_boxes: MotionBoxSet,

    /// Viewport center for this frame.
    pub viewport: ViewportPosition,
}

impl AnalysisReport {
    /// Assemble a report from index-aligned detection and tracking outputs.
    pub fn new(
        source: SourceInfo,
        detection: DetectionParams,
        tracking: TrackingParams,
        motion: Vec<MotionBoxSet>,
        viewports: Vec<ViewportPosition>,
    ) -> Result<Self, ReportError> {
        if motion.len() != viewports.len() {
            return Err(ReportError::ValidationError {
                message: format!(
                    "{} motion box sets but {} viewport positions",
                    motion.len(),
                    viewports.len()
                ),
            });
        }

        let frames = motion
            .into_iter()
            .zip(viewports)
            .enumerate()
            .map(|(index, (motion_boxes, viewport))| FrameAnalysis {
                index,
                motion_boxes,
                viewport,
            })
            .collect();

        Ok(Self {
            version: REPORT_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            source,
            detection,
            tracking,
            frames,
        })
    }

    /// Load a report from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref().to_path_buf();
        let json = std::fs::read_to_string(&path).map_err(|e| ReportError::IoError {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ReportError::ParseError { path, source: e })
    }

    /// Save the report as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ReportError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ReportError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ReportError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check index alignment and the geometric invariants of every entry.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];
        let dims = self.source.dimensions;
        let viewport = self.tracking.viewport;

        if !viewport.fits_within(dims) {
            errors.push(format!("Viewport {viewport} does not fit frames of {dims}"));
        }

        for (position, frame) in self.frames.iter().enumerate() {
            if frame.index != position {
                errors.push(format!(
                    "Frame entry {position} carries index {}",
                    frame.index
                ));
            }

            for b in &frame.motion_boxes {
                if !b.fits_within(dims) {
                    errors.push(format!(
                        "Frame {}: motion box ({}, {}, {}, {}) exceeds {dims}",
                        frame.index, b.x, b.y, b.width, b.height
                    ));
                }
            }

            if frame
                .motion_boxes
                .boxes()
                .windows(2)
                .any(|w| w[0].area() < w[1].area())
            {
                errors.push(format!(
                    "Frame {}: motion boxes are not sorted by area",
                    frame.index
                ));
            }

            if !frame.viewport.is_contained(viewport, dims) {
                errors.push(format!(
                    "Frame {}: viewport center ({}, {}) leaves the frame",
                    frame.index, frame.viewport.x, frame.viewport.y
                ));
            }
        }

        errors
    }

    /// Number of frames with at least one motion box.
    pub fn frames_with_motion(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| !f.motion_boxes.is_empty())
            .count()
    }
}

/// Errors that can occur when working with reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid report: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MotionBox;

    fn sample_report() -> AnalysisReport {
        AnalysisReport::new(
            SourceInfo {
                path: "clips/rally".to_string(),
                dimensions: FrameDimensions::new(1280, 720),
                sample_fps: 5.0,
                frame_stride: 6,
            },
            DetectionParams {
                threshold: 25,
                min_area: 100,
            },
            TrackingParams {
                viewport: ViewportSize::new(640, 360),
                smoothing_factor: 0.3,
            },
            vec![
                MotionBoxSet::empty(),
                MotionBoxSet::from_unsorted(vec![MotionBox::new(450, 450, 100, 100)]),
            ],
            vec![ViewportPosition::new(640, 360), ViewportPosition::new(598, 402)],
        )
        .unwrap()
    }

    #[test]
    fn test_report_is_index_aligned() {
        let report = sample_report();
        assert_eq!(report.version, REPORT_VERSION);
        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.frames[1].index, 1);
        assert_eq!(report.frames_with_motion(), 1);
        assert!(report.validate().is_empty());
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let result = AnalysisReport::new(
            SourceInfo {
                path: String::new(),
                dimensions: FrameDimensions::new(100, 100),
                sample_fps: 0.0,
                frame_stride: 1,
            },
            DetectionParams {
                threshold: 25,
                min_area: 100,
            },
            TrackingParams {
                viewport: ViewportSize::new(50, 50),
                smoothing_factor: 0.3,
            },
            vec![MotionBoxSet::empty()],
            vec![],
        );
        assert!(matches!(result, Err(ReportError::ValidationError { .. })));
    }

    #[test]
    fn test_validate_flags_escaped_viewport() {
        let mut report = sample_report();
        report.frames[1].viewport = ViewportPosition::new(1200, 100);
        let errors = report.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("leaves the frame"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("reframe_test_report");
        let _ = std::fs::remove_dir_all(&dir);

        let report = sample_report();
        let path = dir.join("nested").join("report.json");
        report.save(&path).unwrap();

        let loaded = AnalysisReport::load(&path).unwrap();
        assert_eq!(loaded.frames, report.frames);
        assert_eq!(loaded.source.dimensions, report.source.dimensions);
        assert_eq!(loaded.detection, report.detection);
        assert_eq!(loaded.source.frame_stride, 6);
        assert!((loaded.tracking.smoothing_factor - 0.3).abs() < 1e-12);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("reframe_test_missing").join("report.json");
        assert!(matches!(
            AnalysisReport::load(path),
            Err(ReportError::IoError { .. })
        ));
    }
}
