//! Building blocks shared across the extraction pipeline: geometry for
//! evidence boxes and value normalization for OCR text.

pub mod geometry;
pub mod normalization;

pub use geometry::BoundingBox;
pub use normalization::{collapse_spaces, normalize_amount, normalize_date, strip_spaces};
