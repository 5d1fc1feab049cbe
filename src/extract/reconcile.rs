//! Value-to-line evidence reconciliation.
//!
//! Fields extracted by the full-text fallback have no pixel evidence of their
//! own. This pass searches the line output for each such value, with
//! progressively looser matching, and attaches the first matching line's box.
//! Failing to find a line is fine; the field simply ships without evidence.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{EvidenceMap, FieldKey, OcrLine, ReceiptFields};
use crate::processors::normalization::strip_spaces;

static NUMERIC_VALUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d.]+$").expect("valid regex"));

fn line_matches(line_text: &str, value: &str, value_norm: &str) -> bool {
    if line_text.contains(value) {
        return true;
    }
    // Space-insensitive containment, but only for values long enough that a
    // single stray character cannot bind the wrong line.
    if value_norm.chars().count() >= 2 && strip_spaces(line_text).contains(value_norm) {
        return true;
    }
    // Numeric values may appear with grouping separators in the line.
    if NUMERIC_VALUE_RE.is_match(value_norm) {
        let unseparated: String = line_text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',' && *c != '，')
            .collect();
        if unseparated.contains(value_norm) {
            return true;
        }
    }
    false
}

/// Attaches line boxes to fields that have a value but no evidence yet.
pub(crate) fn assign_evidence_from_lines(
    lines: &[OcrLine],
    fields: &ReceiptFields,
    evidence: &mut EvidenceMap,
) {
    if lines.is_empty() {
        return;
    }
    for key in FieldKey::ALL {
        if evidence.contains_key(&key) {
            continue;
        }
        let Some(value) = fields.value_text(key) else {
            continue;
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        let value_norm = strip_spaces(&value);
        let hit = lines
            .iter()
            .find(|l| line_matches(&l.text, &value, &value_norm));
        if let Some(line) = hit
            && let Some(b) = line.bbox
        {
            evidence.insert(key, b);
        }
    }
}
