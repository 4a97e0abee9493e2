//! Motion boxes and regions of interest.

use serde::{Deserialize, Serialize};

use crate::frame::FrameDimensions;

/// Axis-aligned bounding box of one connected region of inter-frame change.
///
/// `(x, y)` is the top-left pixel. A box produced by detection always satisfies
/// `x + width <= frame_width` and `y + height <= frame_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MotionBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl MotionBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build the smallest box containing both inclusive corners.
    ///
    /// Corners may be given in any order.
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
    }

    /// `width * height`, the sort key for [`MotionBoxSet`].
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Center point using integer division.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// One past the right-most column.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// One past the bottom-most row.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Whether the box lies entirely inside a frame of the given size.
    pub fn fits_within(&self, dims: FrameDimensions) -> bool {
        self.right() <= dims.width as u64 && self.bottom() <= dims.height as u64
    }

    /// Whether the pixel `(px, py)` is covered by the box.
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && (px as u64) < self.right() && py >= self.y && (py as u64) < self.bottom()
    }
}

/// All motion boxes found in one frame, largest first.
///
/// Ordering is by descending `width * height`; equal areas keep discovery
/// order. The order is a priority hint for consumers, not an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionBoxSet {
    boxes: Vec<MotionBox>,
}

impl MotionBoxSet {
    /// The empty set, used for the first frame and for failed detections.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sort boxes in discovery order into a set.
    pub fn from_unsorted(mut boxes: Vec<MotionBox>) -> Self {
        // sort_by is stable, ties keep discovery order
        boxes.sort_by(|a, b| b.area().cmp(&a.area()));
        Self { boxes }
    }

    pub fn boxes(&self) -> &[MotionBox] {
        &self.boxes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MotionBox> {
        self.boxes.iter()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// The highest-priority box, if any.
    pub fn largest(&self) -> Option<&MotionBox> {
        self.boxes.first()
    }

    /// Sum of box areas.
    pub fn total_area(&self) -> u64 {
        self.boxes.iter().map(MotionBox::area).sum()
    }
}

impl<'a> IntoIterator for &'a MotionBoxSet {
    type Item = &'a MotionBox;
    type IntoIter = std::slice::Iter<'a, MotionBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

impl FromIterator<MotionBox> for MotionBoxSet {
    fn from_iter<I: IntoIterator<Item = MotionBox>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

/// Aggregated "where to look" rectangle for one frame, given by its center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub center_x: u32,
    pub center_y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionOfInterest {
    pub fn new(center_x: u32, center_y: u32, width: u32, height: u32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (u32, u32) {
        (self.center_x, self.center_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_box_center_uses_integer_division() {
        let b = MotionBox::new(10, 20, 5, 7);
        assert_eq!(b.center(), (12, 23));
        assert_eq!(b.area(), 35);
    }

    #[test]
    fn test_from_corners_is_inclusive() {
        let b = MotionBox::from_corners((29, 5), (10, 24));
        assert_eq!(b, MotionBox::new(10, 5, 20, 20));
    }

    #[test]
    fn test_fits_within_frame() {
        let dims = FrameDimensions::new(100, 100);
        assert!(MotionBox::new(80, 80, 20, 20).fits_within(dims));
        assert!(!MotionBox::new(81, 80, 20, 20).fits_within(dims));
    }

    #[test]
    fn test_contains_is_half_open() {
        let b = MotionBox::new(10, 10, 5, 5);
        assert!(b.contains(10, 10));
        assert!(b.contains(14, 14));
        assert!(!b.contains(15, 14));
    }

    #[test]
    fn test_set_sorts_by_area_descending() {
        let set = MotionBoxSet::from_unsorted(vec![
            MotionBox::new(0, 0, 2, 2),
            MotionBox::new(0, 0, 10, 10),
            MotionBox::new(0, 0, 5, 5),
        ]);
        let areas: Vec<u64> = set.iter().map(MotionBox::area).collect();
        assert_eq!(areas, vec![100, 25, 4]);
        assert_eq!(set.largest().unwrap().width, 10);
    }

    #[test]
    fn test_set_sort_is_stable_for_ties() {
        let first = MotionBox::new(0, 0, 4, 5);
        let second = MotionBox::new(50, 50, 5, 4);
        let set = MotionBoxSet::from_unsorted(vec![first, second]);
        assert_eq!(set.boxes(), &[first, second]);
    }

    #[test]
    fn test_set_serializes_as_plain_array() {
        let set = MotionBoxSet::from_unsorted(vec![MotionBox::new(1, 2, 3, 4)]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"x":1,"y":2,"width":3,"height":4}]"#);
        let parsed: MotionBoxSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    proptest! {
        #[test]
        fn prop_set_is_sorted_permutation(
            raw in prop::collection::vec((0u32..500, 0u32..500, 0u32..60, 0u32..60), 0..12)
        ) {
            let boxes: Vec<MotionBox> = raw
                .into_iter()
                .map(|(x, y, w, h)| MotionBox::new(x, y, w, h))
                .collect();
            let set = MotionBoxSet::from_unsorted(boxes.clone());

            prop_assert_eq!(set.len(), boxes.len());
            prop_assert!(set.boxes().windows(2).all(|w| w[0].area() >= w[1].area()));
            prop_assert_eq!(set.total_area(), boxes.iter().map(MotionBox::area).sum::<u64>());
        }
    }
}
