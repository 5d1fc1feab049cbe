//! Region-guided field extraction and validation for OCR'd Chinese receipts.
//!
//! The crate turns raw recognition output into a validated receipt with
//! seven fields (发票号码, 开票日期, 名称1, 名称2, 项目名称, 金额, 税额),
//! each carrying pixel evidence where the input allows it. Two entry points
//! cover the two input shapes:
//!
//! - [`parse`] runs on full recognized text plus optional line output:
//!   layout association binds values to labeled lines, the amount-column
//!   geometry reads the 金额/税额 table, and a whitespace-tolerant regex
//!   fallback fills the rest before validation.
//! - [`RegionExtractor`] runs on a page image plus a [`RegionSet`]: each
//!   field's region is cropped, cleaned of colored overprint and recognized
//!   independently through an [`OcrEngine`] under one time budget.
//!
//! [`extract_partial`] is the validation-free variant of [`parse`] for
//! degraded scans.
//!
//! ```no_run
//! use fapiao_ocr::{parse, OcrLine};
//!
//! # fn main() -> Result<(), fapiao_ocr::ExtractError> {
//! let text = "发票号码: 12345678901234\n...";
//! let lines: Vec<OcrLine> = Vec::new();
//! let receipt = parse(text, &lines)?;
//! println!("{} {}", receipt.invoice_number, receipt.amount);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod engine;
pub mod extract;
pub mod processors;
pub mod regions;

pub use crate::core::{ExtractError, ValidationReport, Violation};
pub use crate::domain::{
    EvidenceMap, FieldKey, OcrLine, OcrWord, RawOcr, Receipt, ReceiptFields,
};
pub use crate::engine::OcrEngine;
pub use crate::extract::{extract_partial, parse, validate};
pub use crate::processors::BoundingBox;
pub use crate::regions::{Region, RegionExtraction, RegionExtractor, RegionSet};
