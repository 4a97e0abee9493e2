use image::Rgb;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use reframe_frame_model::frame::{Frame, FrameDimensions};
use reframe_frame_model::viewport::{ViewportPosition, ViewportSize};
use reframe_processing_core::motion::{MotionConfig, MotionDetector};
use reframe_processing_core::sequence::{analyze_sequence, SequenceConfig};
use reframe_processing_core::viewport_tracker::TrackerConfig;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

fn blank() -> Frame {
    Frame::from_pixel(WIDTH, HEIGHT, Rgb([16, 16, 16]))
}

fn paint(frame: &mut Frame, x: u32, y: u32, size: u32, color: Rgb<u8>) {
    draw_filled_rect_mut(frame, Rect::at(x as i32, y as i32).of_size(size, size), color);
}

/// A bright square sliding right along a fixed row.
fn sliding_square(steps: u32, stride: u32) -> Vec<Frame> {
    (0..steps)
        .map(|i| {
            let mut frame = blank();
            paint(&mut frame, 20 + i * stride, 120, 24, Rgb([240, 240, 240]));
            frame
        })
        .collect()
}

fn config(viewport: ViewportSize, smoothing: f64) -> SequenceConfig {
    SequenceConfig {
        motion: MotionConfig::default(),
        tracker: TrackerConfig::new(viewport, smoothing),
    }
}

#[test]
fn static_scene_keeps_viewport_centered() {
    let frames = vec![blank(); 6];
    let analysis = analyze_sequence(&frames, config(ViewportSize::new(160, 90), 0.3)).unwrap();

    assert!(analysis.motion.iter().all(|m| m.is_empty()));
    assert!(analysis
        .viewports
        .iter()
        .all(|p| *p == ViewportPosition::new(160, 90)));
}

#[test]
fn viewport_follows_moving_square() {
    let frames = sliding_square(10, 25);
    let size = ViewportSize::new(160, 90);
    let analysis = analyze_sequence(&frames, config(size, 0.5)).unwrap();

    assert!(analysis.motion[0].is_empty());
    for (i, boxes) in analysis.motion.iter().enumerate().skip(1) {
        assert!(!boxes.is_empty(), "frame {i} lost the square");
    }

    // starts left of center and drifts right with the square
    let first = analysis.viewports[1];
    let last = *analysis.viewports.last().unwrap();
    assert!(first.x < 160, "first viewport x = {}", first.x);
    assert!(last.x > first.x, "viewport did not follow: {} -> {}", first.x, last.x);
    // the square sits low in the frame, so the viewport drops toward it
    assert!(last.y > 90);

    let dims = FrameDimensions::new(WIDTH, HEIGHT);
    for p in &analysis.viewports {
        assert!(p.is_contained(size, dims));
    }
}

#[test]
fn faint_flicker_is_ignored() {
    let mut frames = vec![blank(); 4];
    // +10 brightness: below the default threshold of 25
    paint(&mut frames[2], 100, 60, 40, Rgb([26, 26, 26]));

    let analysis = analyze_sequence(&frames, config(ViewportSize::new(160, 90), 0.3)).unwrap();
    assert!(analysis.motion.iter().all(|m| m.is_empty()));
}

#[test]
fn larger_region_is_reported_first() {
    let prev = blank();
    let mut curr = blank();
    paint(&mut curr, 20, 20, 20, Rgb([255, 255, 255]));
    paint(&mut curr, 200, 80, 60, Rgb([255, 255, 255]));

    let boxes = MotionDetector::with_defaults().detect(&prev, &curr).unwrap();
    assert_eq!(boxes.len(), 2);
    assert!(boxes.boxes()[0].area() >= boxes.boxes()[1].area());
    assert!(boxes.boxes()[0].x > 150, "largest box should be the right-hand square");
}

#[test]
fn higher_min_area_drops_small_motion() {
    let prev = blank();
    let mut curr = blank();
    paint(&mut curr, 150, 80, 6, Rgb([255, 255, 255]));

    let loose = MotionDetector::new(MotionConfig {
        threshold: 25,
        min_area: 10,
    })
    .unwrap();
    let strict = MotionDetector::new(MotionConfig {
        threshold: 25,
        min_area: 5_000,
    })
    .unwrap();

    assert_eq!(loose.detect(&prev, &curr).unwrap().len(), 1);
    assert!(strict.detect(&prev, &curr).unwrap().is_empty());
}

#[test]
fn report_from_sequence_validates() {
    let frames = sliding_square(5, 30);
    let report = analyze_sequence(&frames, config(ViewportSize::new(160, 90), 0.3))
        .unwrap()
        .into_report("synthetic/sliding", 5.0, 1)
        .unwrap();

    assert_eq!(report.frames.len(), 5);
    assert_eq!(report.frames_with_motion(), 4);
    assert!(report.validate().is_empty(), "{:?}", report.validate());
}
