//! Reframe Render Engine
//!
//! Offline rendering that combines decoded frames with an analysis report
//! into numbered image sequences, optionally encoded to MP4 with ffmpeg.
//!
//! # Pipeline Architecture
//!
//! ```text
//! frames/*.png ──┐
//!                ├── Overlay (motion boxes + viewport outline) ──► frames/frame_NNNN.png
//! report.json ───┤
//!                └── Crop (viewport, resized to exact size) ─────► viewport/viewport_NNNN.png
//!
//! ffmpeg (optional): frames/ ──► motion_detection.mp4, viewport/ ──► viewport_tracking.mp4
//! ```

pub mod compositor;
pub mod export;
pub mod label;

pub use compositor::{crop_viewport, draw_overlay, OverlayStyle};
pub use export::*;
