//! Viewport ("virtual camera") types.
//!
//! The viewport has a fixed pixel size for a whole sequence; only its center
//! moves from frame to frame.

use serde::{Deserialize, Serialize};

use crate::frame::FrameDimensions;

/// Fixed size of the viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Half extents, rounded down.
    pub fn half(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }

    /// Whether the viewport is non-empty and no larger than the frame.
    pub fn fits_within(&self, dims: FrameDimensions) -> bool {
        self.width > 0 && self.height > 0 && self.width <= dims.width && self.height <= dims.height
    }

    /// Parse a `WIDTHxHEIGHT` string such as `640x360`.
    pub fn parse(text: &str) -> Option<Self> {
        let (w, h) = text.trim().split_once(|c: char| c == 'x' || c == 'X')?;
        let width = w.trim().parse().ok()?;
        let height = h.trim().parse().ok()?;
        Some(Self::new(width, height))
    }
}

impl std::fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Center of the viewport for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportPosition {
    pub x: u32,
    pub y: u32,
}

impl ViewportPosition {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Viewport centered on the frame.
    pub fn frame_center(dims: FrameDimensions) -> Self {
        let (x, y) = dims.center();
        Self::new(x, y)
    }

    /// Clamp each axis to `[half, frame - half]` so the viewport stays inside.
    ///
    /// Requires `size.fits_within(dims)`; otherwise the lower bound wins.
    pub fn clamp_into(self, size: ViewportSize, dims: FrameDimensions) -> Self {
        let (half_w, half_h) = size.half();
        let max_x = dims.width.saturating_sub(half_w).max(half_w);
        let max_y = dims.height.saturating_sub(half_h).max(half_h);
        Self::new(self.x.clamp(half_w, max_x), self.y.clamp(half_h, max_y))
    }

    /// Whether the viewport centered here is inside the frame.
    pub fn is_contained(&self, size: ViewportSize, dims: FrameDimensions) -> bool {
        let (half_w, half_h) = size.half();
        self.x >= half_w
            && self.y >= half_h
            && self.x as u64 + half_w as u64 <= dims.width as u64
            && self.y as u64 + half_h as u64 <= dims.height as u64
    }

    /// The pixel rectangle covered by a viewport of `size` centered here.
    ///
    /// Left/top are `center - half`; the rectangle keeps the full viewport size
    /// and is not clipped.
    pub fn crop_rect(&self, size: ViewportSize) -> CropRect {
        let (half_w, half_h) = size.half();
        CropRect {
            left: self.x as i64 - half_w as i64,
            top: self.y as i64 - half_h as i64,
            width: size.width,
            height: size.height,
        }
    }
}

/// A rectangle in frame pixel coordinates that may extend past the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Intersection with the frame as `(x, y, width, height)`, or `None` when
    /// nothing of the rectangle is visible.
    pub fn clipped_to(&self, dims: FrameDimensions) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.left.max(0);
        let y0 = self.top.max(0);
        let x1 = (self.left + self.width as i64).min(dims.width as i64);
        let y1 = (self.top + self.height as i64).min(dims.height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}
