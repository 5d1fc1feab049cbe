//! OCR engine output types.
//!
//! The engine is a black box returning plain text plus, optionally, lines with
//! boxes and word-level boxes. Lines arrive in OCR reading order
//! (top-to-bottom, then left-to-right), but that ordering is approximate —
//! column geometry re-derives true reading order from word boxes when
//! precision matters.

use crate::processors::BoundingBox;
use serde::{Deserialize, Serialize};

/// A single recognized word with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    /// The recognized word text.
    pub text: String,
    /// The word's bounding box.
    pub bbox: BoundingBox,
}

/// A recognized line of text with optional geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    /// The recognized line text, possibly with OCR-inserted spaces.
    pub text: String,
    /// The line's bounding box, when the engine reports one.
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    /// Word-level boxes within the line, when the engine reports them.
    #[serde(default)]
    pub words: Vec<OcrWord>,
}

impl OcrLine {
    /// A line with text only, no geometry.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox: None,
            words: Vec::new(),
        }
    }
}

/// Raw output of one OCR engine invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOcr {
    /// The full recognized text.
    pub text: String,
    /// Line-level layout, when the engine provides it.
    #[serde(default)]
    pub lines: Option<Vec<OcrLine>>,
}
