//! Line-oriented layout association.
//!
//! Walks the engine's line output and binds field values to the lines their
//! labels appear on, carrying each line's box along as pixel evidence. Label
//! detection runs on the space-stripped text; value capture prefers the raw
//! line so spacing inside values survives.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{EvidenceMap, FieldKey, OcrLine, ReceiptFields};
use crate::extract::column::{self, AmountColumn};
use crate::extract::fallback::bounded_captures;
use crate::processors::normalization::{collapse_spaces, normalize_amount, strip_spaces};

static INVOICE_NO_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"发票\s*号\s*码\s*[：:\s]*(\S+)").expect("valid regex"));
static DATE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"开\s*票\s*日\s*期\s*[：:\s]*(.+)").expect("valid regex"));
static NAME_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"名\s*称\s*[：:\s]*(.+)").expect("valid regex"));
static NAME_LABEL_SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"名称\s*[：:\s]").expect("valid regex"));
static MERGED_NAME_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"名\s*称\s*[：:\s]*").expect("valid regex"));
static MERGED_NAME_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*名\s*称|项\s*目|金\s*额|税\s*[额领]").expect("valid regex"));
static PROJECT_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"项\s*目\s*名\s*称\s*[：:\s]*").expect("valid regex"));
static AMOUNT_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"金\s*额\s*[：:\s]*([\d.\s,，]+)").expect("valid regex"));
static AMOUNT_LOOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+\s*[\d.]+)").expect("valid regex"));
static TAX_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"税\s*[额领]\s*[：:\s]*([\d.\s,，]+)").expect("valid regex"));
static TAX_LOOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.?\d*)\s*$").expect("valid regex"));
static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid regex"));
static AMOUNT_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d.]").expect("valid regex"));
static NAME_SUFFIX_NOISE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[罗等]\s*$").expect("valid regex"));

/// Captures a value from the raw line, retrying on the space-stripped line
/// when the raw form does not match. Collapsed and trimmed; empty becomes
/// `None`.
fn value_from_line(raw: &str, re: &Regex) -> Option<String> {
    fn first_group(caps: regex::Captures<'_>) -> Option<String> {
        caps.get(1)
            .map(|m| collapse_spaces(m.as_str()))
            .filter(|v| !v.is_empty())
    }
    if let Some(caps) = re.captures(raw) {
        return first_group(caps);
    }
    let norm = strip_spaces(raw);
    re.captures(&norm).and_then(first_group)
}

/// The project value runs from the label to the first table-header character
/// (规格单位数量价), and only counts when that character opens 规格 or 单位.
fn project_value(text: &str) -> Option<String> {
    const STOP_CHARS: &[char] = &['规', '格', '单', '位', '数', '量', '价'];
    let label = PROJECT_LABEL_RE.find(text)?;
    let after = &text[label.end()..];
    let captured = match after.find(STOP_CHARS) {
        Some(i) => {
            let tail = &after[i..];
            if tail.starts_with("规格") || tail.starts_with("单位") {
                &after[..i]
            } else {
                return None;
            }
        }
        None => after,
    };
    let value = collapse_spaces(captured);
    (!value.is_empty()).then_some(value)
}

fn strip_name_noise(value: &str) -> String {
    NAME_SUFFIX_NOISE_RE.replace(value, "").trim().to_string()
}

/// Associates fields with the lines their labels appear on.
///
/// Values are left raw where later stages refine them: the invoice date is
/// returned as captured, and normalized by the pipeline.
pub(crate) fn extract_from_lines(lines: &[OcrLine]) -> (ReceiptFields, EvidenceMap) {
    let mut fields = ReceiptFields::default();
    let mut evidence = EvidenceMap::new();
    if lines.is_empty() {
        return (fields, evidence);
    }

    // Column geometry first; the per-line regexes below only fill what it
    // leaves unset.
    if lines.iter().any(|l| !l.words.is_empty()) {
        if let Some(hit) = column::find_amount_under_column(lines, AmountColumn::Amount) {
            fields.amount = Some(hit.value);
            evidence.insert(FieldKey::Amount, hit.bbox);
        }
        if let Some(hit) = column::find_amount_under_column(lines, AmountColumn::Tax) {
            fields.tax = Some(hit.value);
            evidence.insert(FieldKey::Tax, hit.bbox);
        }
    }

    for line in lines {
        let norm = strip_spaces(&line.text);
        if norm.contains("发票号码") && DIGIT_RE.is_match(&line.text) {
            if let Some(v) = value_from_line(&line.text, &INVOICE_NO_LINE_RE) {
                let digits = strip_spaces(&v);
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    fields.invoice_number = Some(digits);
                    if let Some(b) = line.bbox {
                        evidence.insert(FieldKey::InvoiceNumber, b);
                    }
                }
            }
        }
        if norm.contains("开票日期") && YEAR_RE.is_match(&line.text) {
            if let Some(v) = value_from_line(&line.text, &DATE_LINE_RE) {
                fields.invoice_date = Some(v);
                if let Some(b) = line.bbox {
                    evidence.insert(FieldKey::InvoiceDate, b);
                }
            }
        }
    }

    associate_names(lines, &mut fields, &mut evidence);

    for line in lines {
        let norm = strip_spaces(&line.text);
        if fields.project_name.is_none() && norm.contains("项目名称") {
            let v = project_value(&line.text).or_else(|| project_value(&norm));
            if let Some(v) = v {
                fields.project_name = Some(v);
                if let Some(b) = line.bbox {
                    evidence.insert(FieldKey::ProjectName, b);
                }
            }
        }
        if fields.amount.is_none()
            && norm.contains("金额")
            && AMOUNT_CHAR_RE.is_match(&line.text)
        {
            let caps = AMOUNT_LINE_RE
                .captures(&line.text)
                .or_else(|| AMOUNT_LOOSE_RE.captures(&line.text));
            if let Some(caps) = caps
                && let Some(m) = caps.get(1)
            {
                fields.amount = normalize_amount(m.as_str());
                if let Some(b) = line.bbox {
                    evidence.insert(FieldKey::Amount, b);
                }
            }
        }
        if fields.tax.is_none() && (norm.contains("税额") || norm.contains("税领")) {
            let caps = TAX_LINE_RE
                .captures(&line.text)
                .or_else(|| TAX_LOOSE_RE.captures(&line.text));
            if let Some(caps) = caps
                && let Some(m) = caps.get(1)
            {
                fields.tax = normalize_amount(m.as_str());
                if let Some(b) = line.bbox {
                    evidence.insert(FieldKey::Tax, b);
                }
            }
        }
    }

    (fields, evidence)
}

/// A line carries a name label when it contains 名称 plus either a colon or,
/// for colon-less OCR output, enough trailing text to hold a value.
fn is_name_line(line: &OcrLine) -> bool {
    let norm = strip_spaces(&line.text);
    norm.contains("名称")
        && (norm.contains('：')
            || norm.contains(':')
            || (NAME_LABEL_SEP_RE.is_match(&line.text) && line.text.chars().count() > 10))
}

fn associate_names(lines: &[OcrLine], fields: &mut ReceiptFields, evidence: &mut EvidenceMap) {
    let name_lines: Vec<&OcrLine> = lines.iter().filter(|l| is_name_line(l)).collect();
    match name_lines.len() {
        0 => {}
        1 => {
            // Both names collapsed into one OCR line; split on the label
            // occurrences.
            let line = name_lines[0];
            let values = bounded_captures(&line.text, &MERGED_NAME_LABEL_RE, &MERGED_NAME_BOUNDARY_RE);
            if let Some(first) = values.first() {
                let v1 = strip_name_noise(first);
                if !v1.is_empty() {
                    fields.name1 = Some(v1);
                    if let Some(b) = line.bbox {
                        evidence.insert(FieldKey::Name1, b);
                    }
                }
            }
            if let Some(second) = values.get(1) {
                let v2 = second.trim().to_string();
                if !v2.is_empty() {
                    fields.name2 = Some(v2);
                    if let Some(b) = line.bbox {
                        evidence.insert(FieldKey::Name2, b);
                    }
                }
            }
        }
        _ => {
            // First two label lines in document order are seller and buyer.
            if let Some(v) = value_from_line(&name_lines[0].text, &NAME_VALUE_RE) {
                fields.name1 = Some(v);
                if let Some(b) = name_lines[0].bbox {
                    evidence.insert(FieldKey::Name1, b);
                }
            }
            if let Some(v) = value_from_line(&name_lines[1].text, &NAME_VALUE_RE) {
                fields.name2 = Some(v);
                if let Some(b) = name_lines[1].bbox {
                    evidence.insert(FieldKey::Name2, b);
                }
            }
        }
    }
}
