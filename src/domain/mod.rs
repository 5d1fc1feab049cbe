//! Domain data model: the receipt field set and the OCR output it is
//! extracted from.

pub mod fields;
pub mod ocr;

pub use fields::{EvidenceMap, FieldKey, Receipt, ReceiptFields};
pub use ocr::{OcrLine, OcrWord, RawOcr};
