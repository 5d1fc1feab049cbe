//! The receipt field model.
//!
//! A receipt yields a fixed set of seven fields: 发票号码, 开票日期, two 名称
//! counterparties, 项目名称, 金额, and 税额. [`ReceiptFields`] is the partial
//! set produced by extraction; [`Receipt`] is the validated set every field of
//! which is guaranteed present. Evidence boxes travel separately in an
//! [`EvidenceMap`] because a field may legitimately have a value with no
//! recoverable box.

use crate::processors::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one of the seven receipt fields.
///
/// Serializes to the Chinese field label, matching the wire shape of region
/// configuration documents and produced results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    /// 发票号码 — the invoice number.
    #[serde(rename = "发票号码")]
    InvoiceNumber,
    /// 开票日期 — the invoice date.
    #[serde(rename = "开票日期")]
    InvoiceDate,
    /// 名称 (first occurrence) — the seller name.
    #[serde(rename = "名称1")]
    Name1,
    /// 名称 (second occurrence) — the buyer name.
    #[serde(rename = "名称2")]
    Name2,
    /// 项目名称 — the project / line-item name.
    #[serde(rename = "项目名称")]
    ProjectName,
    /// 金额 — the pre-tax amount.
    #[serde(rename = "金额")]
    Amount,
    /// 税额 — the tax amount.
    #[serde(rename = "税额")]
    Tax,
}

impl FieldKey {
    /// All seven field keys in canonical document order.
    pub const ALL: [FieldKey; 7] = [
        FieldKey::InvoiceNumber,
        FieldKey::InvoiceDate,
        FieldKey::Name1,
        FieldKey::Name2,
        FieldKey::ProjectName,
        FieldKey::Amount,
        FieldKey::Tax,
    ];

    /// The Chinese label for this field, as it appears on the document and in
    /// configuration keys.
    pub fn label(self) -> &'static str {
        match self {
            FieldKey::InvoiceNumber => "发票号码",
            FieldKey::InvoiceDate => "开票日期",
            FieldKey::Name1 => "名称1",
            FieldKey::Name2 => "名称2",
            FieldKey::ProjectName => "项目名称",
            FieldKey::Amount => "金额",
            FieldKey::Tax => "税额",
        }
    }

    /// Resolves a configuration key back to a field key.
    pub fn from_label(label: &str) -> Option<FieldKey> {
        FieldKey::ALL.into_iter().find(|k| k.label() == label)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evidence bounding boxes keyed by field, in image pixel coordinates.
pub type EvidenceMap = BTreeMap<FieldKey, BoundingBox>;

/// The partial extracted field set: every field optional.
///
/// Produced by the layout associator, the fallback extractor, and the
/// region-crop orchestrator; consumed by validation. The invoice date, when
/// set by the full-text pipeline, is already canonical `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptFields {
    /// 发票号码, digits only when set by extraction.
    pub invoice_number: Option<String>,
    /// 开票日期 as canonical `YYYY-MM-DD` (or raw OCR text on the region path).
    pub invoice_date: Option<String>,
    /// First 名称.
    pub name1: Option<String>,
    /// Second 名称.
    pub name2: Option<String>,
    /// 项目名称.
    pub project_name: Option<String>,
    /// 金额 as a finite number.
    pub amount: Option<f64>,
    /// 税额 as a finite number.
    pub tax: Option<f64>,
}

impl ReceiptFields {
    /// The field's value rendered as display text, used for evidence-box
    /// reconciliation against OCR line text.
    pub(crate) fn value_text(&self, key: FieldKey) -> Option<String> {
        match key {
            FieldKey::InvoiceNumber => self.invoice_number.clone(),
            FieldKey::InvoiceDate => self.invoice_date.clone(),
            FieldKey::Name1 => self.name1.clone(),
            FieldKey::Name2 => self.name2.clone(),
            FieldKey::ProjectName => self.project_name.clone(),
            FieldKey::Amount => self.amount.map(format_number),
            FieldKey::Tax => self.tax.map(format_number),
        }
    }
}

/// Formats an amount the way it is most likely to appear in OCR text: no
/// trailing `.0` for whole values.
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// A fully validated receipt: every field present and well-formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// 发票号码, all digits.
    pub invoice_number: String,
    /// 开票日期, canonical `YYYY-MM-DD`.
    pub invoice_date: String,
    /// First 名称.
    pub name1: String,
    /// Second 名称.
    pub name2: String,
    /// 项目名称.
    pub project_name: String,
    /// 金额.
    pub amount: f64,
    /// 税额.
    pub tax: f64,
    /// Evidence boxes for whichever fields have one.
    pub evidence: EvidenceMap,
}
