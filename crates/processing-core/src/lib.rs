//! Reframe Processing Core: the motion analysis engine.
//!
//! Turns a frame sequence into per-frame decisions:
//! - **Motion detection:** frame differencing into bounding boxes
//! - **ROI aggregation:** one area-weighted target per frame
//! - **Viewport tracking:** a smoothed, in-bounds viewport center per frame
//!
//! This crate is pure computation. Frames come in as decoded images; results
//! go out as data. Reading and writing files is left to callers.

pub mod motion;
pub mod roi;
pub mod sequence;
pub mod viewport_tracker;

pub use motion::{MotionConfig, MotionDetector};
pub use roi::aggregate;
pub use sequence::{analyze_sequence, SequenceAnalysis, SequenceAnalyzer, SequenceConfig};
pub use viewport_tracker::{TrackerConfig, ViewportTracker};
