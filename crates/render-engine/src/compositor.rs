//! Frame compositor: draws analysis results onto frames and cuts out the
//! viewport.

use image::imageops::{self, FilterType};
use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::frame::{Frame, FrameDimensions};
use reframe_frame_model::geometry::MotionBoxSet;
use reframe_frame_model::report::AnalysisReport;
use reframe_frame_model::viewport::{ViewportPosition, ViewportSize};

use crate::label::{draw_text, frame_label};

/// Distance of the frame label from the top-left corner.
const LABEL_MARGIN: u32 = 10;

/// Colors and line width for annotated frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Outline color for motion boxes.
    pub box_color: [u8; 3],

    /// Outline color for the viewport rectangle.
    pub viewport_color: [u8; 3],

    /// Outline thickness in pixels, growing outward.
    pub thickness: u32,

    /// Color of the `Frame: N` label; `None` leaves frames unlabeled.
    pub label_color: Option<[u8; 3]>,

    /// Size of one label font pixel, in image pixels.
    pub label_scale: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: [0, 255, 0],
            viewport_color: [0, 0, 255],
            thickness: 2,
            label_color: Some([255, 255, 255]),
            label_scale: 2,
        }
    }
}

/// A single frame's composition instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameComposition {
    /// Frame number.
    pub frame_index: usize,

    /// Motion boxes to outline.
    pub motion_boxes: MotionBoxSet,

    /// Viewport center to outline and crop around.
    pub viewport: ViewportPosition,
}

/// Compute the composition for each frame in a report.
pub fn compute_compositions(report: &AnalysisReport) -> Vec<FrameComposition> {
    report
        .frames
        .iter()
        .map(|f| FrameComposition {
            frame_index: f.index,
            motion_boxes: f.motion_boxes.clone(),
            viewport: f.viewport,
        })
        .collect()
}

/// Copy `frame` with motion boxes and the viewport outlined.
///
/// Boxes are drawn first so the viewport outline stays on top where they
/// cross. The frame label, if enabled, goes over both.
pub fn draw_overlay(
    frame: &Frame,
    composition: &FrameComposition,
    viewport: ViewportSize,
    style: &OverlayStyle,
) -> Frame {
    let mut out = frame.clone();

    for b in &composition.motion_boxes {
        draw_thick_rect(
            &mut out,
            b.x as i64,
            b.y as i64,
            b.width,
            b.height,
            Rgb(style.box_color),
            style.thickness,
        );
    }

    let rect = composition.viewport.crop_rect(viewport);
    draw_thick_rect(
        &mut out,
        rect.left,
        rect.top,
        rect.width,
        rect.height,
        Rgb(style.viewport_color),
        style.thickness,
    );

    if let Some(color) = style.label_color {
        draw_text(
            &mut out,
            &frame_label(composition.frame_index),
            LABEL_MARGIN,
            LABEL_MARGIN,
            style.label_scale,
            Rgb(color),
        );
    }

    out
}

/// Cut the viewport out of `frame`, always returning exactly `size`.
///
/// The crop is clipped to the frame first; a clipped crop is scaled back up
/// to the full viewport size.
pub fn crop_viewport(
    frame: &Frame,
    viewport: ViewportPosition,
    size: ViewportSize,
) -> ReframeResult<Frame> {
    let dims = FrameDimensions::of(frame);
    let (x, y, w, h) = viewport.crop_rect(size).clipped_to(dims).ok_or_else(|| {
        ReframeError::render(format!(
            "viewport {size} at ({}, {}) does not overlap frame {dims}",
            viewport.x, viewport.y
        ))
    })?;

    let cropped = imageops::crop_imm(frame, x, y, w, h).to_image();
    if (w, h) == (size.width, size.height) {
        return Ok(cropped);
    }

    tracing::debug!(
        clipped = %format!("{w}x{h}"),
        target = %size,
        "viewport crop clipped by frame edge, resizing"
    );
    Ok(imageops::resize(
        &cropped,
        size.width,
        size.height,
        FilterType::Triangle,
    ))
}

/// Outline a rectangle, thickening outward one ring per pixel of width.
fn draw_thick_rect(
    img: &mut Frame,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    color: Rgb<u8>,
    thickness: u32,
) {
    if width == 0 || height == 0 {
        return;
    }

    for offset in 0..thickness.max(1) {
        let left = (x - offset as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        let top = (y - offset as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        let rect = Rect::at(left, top).of_size(
            width.saturating_add(offset * 2),
            height.saturating_add(offset * 2),
        );
        draw_hollow_rect_mut(img, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_frame_model::geometry::MotionBox;

    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn composition(boxes: Vec<MotionBox>, viewport: ViewportPosition) -> FrameComposition {
        FrameComposition {
            frame_index: 0,
            motion_boxes: MotionBoxSet::from_unsorted(boxes),
            viewport,
        }
    }

    #[test]
    fn test_overlay_outlines_boxes_and_viewport() {
        let frame = Frame::new(200, 100);
        let comp = composition(
            vec![MotionBox::new(20, 20, 30, 30)],
            ViewportPosition::new(100, 50),
        );
        let out = draw_overlay(&frame, &comp, ViewportSize::new(100, 50), &OverlayStyle::default());

        // box outline and its outer ring
        assert_eq!(*out.get_pixel(20, 30), GREEN);
        assert_eq!(*out.get_pixel(19, 30), GREEN);
        // box interior untouched
        assert_eq!(*out.get_pixel(35, 35), BLACK);
        // viewport spans x 50..150, y 25..75
        assert_eq!(*out.get_pixel(50, 50), BLUE);
        assert_eq!(*out.get_pixel(100, 25), BLUE);
        assert_eq!(*out.get_pixel(100, 50), BLACK);
        // source frame is not modified
        assert_eq!(*frame.get_pixel(20, 30), BLACK);
    }

    #[test]
    fn test_overlay_tolerates_edge_boxes() {
        let frame = Frame::new(64, 64);
        let comp = composition(
            vec![MotionBox::new(0, 0, 64, 64), MotionBox::new(10, 10, 0, 5)],
            ViewportPosition::new(32, 32),
        );
        let out = draw_overlay(&frame, &comp, ViewportSize::new(64, 64), &OverlayStyle::default());
        assert_eq!(out.dimensions(), (64, 64));
    }

    #[test]
    fn test_overlay_labels_frame_number() {
        let frame = Frame::new(200, 100);
        let mut comp = composition(vec![], ViewportPosition::new(100, 50));
        comp.frame_index = 4;

        let labeled = draw_overlay(&frame, &comp, ViewportSize::new(100, 50), &OverlayStyle::default());
        // top bar of the F in "Frame: 5"
        assert_eq!(*labeled.get_pixel(10, 10), Rgb([255, 255, 255]));
        assert_eq!(*labeled.get_pixel(19, 11), Rgb([255, 255, 255]));

        let style = OverlayStyle {
            label_color: None,
            ..OverlayStyle::default()
        };
        let plain = draw_overlay(&frame, &comp, ViewportSize::new(100, 50), &style);
        assert_eq!(*plain.get_pixel(10, 10), BLACK);
    }

    #[test]
    fn test_crop_inside_frame_is_exact() {
        let mut frame = Frame::new(200, 100);
        frame.put_pixel(50, 25, Rgb([9, 8, 7]));

        let crop = crop_viewport(&frame, ViewportPosition::new(100, 50), ViewportSize::new(100, 50))
            .unwrap();
        assert_eq!(crop.dimensions(), (100, 50));
        assert_eq!(*crop.get_pixel(0, 0), Rgb([9, 8, 7]));
    }

    #[test]
    fn test_clipped_crop_is_resized_to_viewport() {
        let frame = Frame::from_pixel(200, 100, Rgb([10, 20, 30]));
        let crop = crop_viewport(&frame, ViewportPosition::new(10, 10), ViewportSize::new(100, 50))
            .unwrap();
        assert_eq!(crop.dimensions(), (100, 50));
        assert_eq!(*crop.get_pixel(50, 25), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_crop_outside_frame_is_render_error() {
        let frame = Frame::new(64, 64);
        let result = crop_viewport(&frame, ViewportPosition::new(500, 500), ViewportSize::new(32, 32));
        assert!(matches!(result, Err(ReframeError::Render { .. })));
    }
}
