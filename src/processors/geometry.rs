//! Geometric primitives for OCR evidence boxes.
//!
//! Everything in this domain is an axis-aligned rectangle: OCR line and word
//! boxes, configured regions mapped to pixels, and the evidence boxes attached
//! to extracted fields. OCR engines disagree on box encoding, so
//! [`BoundingBox`] deserializes from both the two-corner form
//! (`x0/y0/x1/y1`) and the corner-plus-size form (`left/top/width/height`),
//! normalizing to two corners internally.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in image coordinates.
///
/// `(x0, y0)` is the top-left corner and `(x1, y1)` the bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBBox")]
pub struct BoundingBox {
    /// X-coordinate of the left edge.
    pub x0: f32,
    /// Y-coordinate of the top edge.
    pub y0: f32,
    /// X-coordinate of the right edge.
    pub x1: f32,
    /// Y-coordinate of the bottom edge.
    pub y1: f32,
}

/// Wire form of a bounding box: either two corners or corner plus size.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBBox {
    Corners { x0: f32, y0: f32, x1: f32, y1: f32 },
    CornerSize {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
    },
}

impl From<RawBBox> for BoundingBox {
    fn from(raw: RawBBox) -> Self {
        match raw {
            RawBBox::Corners { x0, y0, x1, y1 } => BoundingBox { x0, y0, x1, y1 },
            RawBBox::CornerSize {
                left,
                top,
                width,
                height,
            } => BoundingBox {
                x0: left,
                y0: top,
                x1: left + width,
                y1: top + height,
            },
        }
    }
}

impl BoundingBox {
    /// Creates a bounding box from two corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Standard open-interval overlap test on the horizontal extent.
    ///
    /// Used by column geometry: a word belongs to a column band when its
    /// x-extent overlaps the band's.
    pub fn overlaps_x(&self, x0: f32, x1: f32) -> bool {
        self.x0 < x1 && self.x1 > x0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_two_corner_form() {
        let b: BoundingBox = serde_json::from_str(r#"{"x0":1,"y0":2,"x1":11,"y1":22}"#).unwrap();
        assert_eq!(b, BoundingBox::new(1.0, 2.0, 11.0, 22.0));
    }

    #[test]
    fn deserializes_corner_size_form() {
        let b: BoundingBox =
            serde_json::from_str(r#"{"left":1,"top":2,"width":10,"height":20}"#).unwrap();
        assert_eq!(b, BoundingBox::new(1.0, 2.0, 11.0, 22.0));
    }

    #[test]
    fn rejects_incomplete_box() {
        let r: Result<BoundingBox, _> = serde_json::from_str(r#"{"x0":1,"y0":2,"x1":11}"#);
        assert!(r.is_err());
    }

    #[test]
    fn overlap_is_open_interval() {
        let b = BoundingBox::new(10.0, 0.0, 20.0, 5.0);
        assert!(b.overlaps_x(15.0, 25.0));
        assert!(b.overlaps_x(5.0, 11.0));
        // Touching edges do not overlap.
        assert!(!b.overlaps_x(20.0, 30.0));
        assert!(!b.overlaps_x(0.0, 10.0));
    }
}
