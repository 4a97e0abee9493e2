//! Frame types.

use serde::{Deserialize, Serialize};

/// A decoded video frame: 3 channels, 8 bits each.
///
/// Frames are owned by the frame source and only ever borrowed by detection
/// and tracking.
pub type Frame = image::RgbImage;

/// Width and height of a frame in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing frame.
    pub fn of(frame: &Frame) -> Self {
        Self::new(frame.width(), frame.height())
    }

    /// Geometric center, rounded down.
    pub fn center(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }

    /// Length of the shorter side.
    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
