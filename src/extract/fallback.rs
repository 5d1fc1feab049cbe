//! Whitespace-tolerant regex fallback over the full OCR text.
//!
//! Runs when layout association leaves a field unset. Labels are matched with
//! optional whitespace between every character, since engines routinely break
//! CJK labels apart. Each field tries an ordered pattern list, most specific
//! first, and the first non-empty capture wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::processors::normalization::normalize_amount;

/// Builds a pattern matching `label` with optional whitespace between every
/// character, so OCR-split labels like `发 票 号 码` still match.
fn key_pattern(label: &str) -> String {
    label
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(r"\s*")
}

/// Captures the value after each `label` occurrence, stopping at the next
/// `boundary` match on the same line (or at the end of input when the value
/// runs there without crossing a newline). Occurrences whose value would be
/// empty, or would have to cross a newline to reach a boundary, yield
/// nothing.
pub(crate) fn bounded_captures(text: &str, label: &Regex, boundary: &Regex) -> Vec<String> {
    let mut out = Vec::new();
    for m in label.find_iter(text) {
        let start = m.end();
        if start >= text.len() {
            continue;
        }
        let rest = &text[start..];
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let captured = match boundary
            .find_iter(rest)
            .find(|b| b.start() >= 1 && b.start() <= line_end)
        {
            Some(b) => &rest[..b.start()],
            None if line_end == rest.len() => rest,
            None => continue,
        };
        let value = captured.trim();
        if !value.is_empty() {
            out.push(value.to_string());
        }
    }
    out
}

static INVOICE_NO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let full = key_pattern("发票号码");
    let short = key_pattern("号码");
    [
        format!(r"{full}\s*[：:\s]*(\d+)"),
        format!(r"{full}\s*[：:\s]*([^\s\n]+)"),
        format!(r"{short}\s*[：:\s]*(\d+)"),
        r"发票号码[：:\s]*(\d+)".to_string(),
        r"发票号码[：:\s]*([^\s\n]+)".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Invoice number from the full text, tried from the strictest pattern down.
pub(crate) fn extract_invoice_number(text: &str) -> Option<String> {
    first_capture(&INVOICE_NO_PATTERNS, text)
}

/// A date body in either Chinese (2024年1月5日) or separator (2024-1-5,
/// 2024/1/5) form, whitespace-tolerant.
const DATE_CORE: &str = r"(\d{4}\s*年\s*\d{1,2}\s*月\s*\d{1,2}\s*日?|\d{4}[-/]\d{1,2}[-/]\d{1,2})";

static INVOICE_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let full = key_pattern("开票日期");
    let short = key_pattern("日期");
    [
        format!(r"{full}\s*[：:\s]*{DATE_CORE}"),
        format!(r"{short}\s*[：:\s]*{DATE_CORE}"),
        r"开票日期[：:\s]*(\d{4}[-年/]\d{1,2}[-月/]\d{1,2}日?)".to_string(),
        r"开票日期[：:\s]*(\d{4}\s*年\s*\d{1,2}\s*月\s*\d{1,2}\s*日?)".to_string(),
        r"日期[：:\s]*(\d{4}[-年/]\d{1,2}[-月/]\d{1,2}日?)".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Raw (un-normalized) invoice date text; the pipeline normalizes it.
pub(crate) fn extract_invoice_date(text: &str) -> Option<String> {
    first_capture(&INVOICE_DATE_PATTERNS, text)
}

static NAME_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"名\s*称\s*[：:\s]*").expect("valid regex"));
static NAME_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"名\s*称|项\s*目\s*名\s*称|金\s*额|税\s*额").expect("valid regex"));
static NAME_LABEL_LIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"名称[：:\s]*").expect("valid regex"));
static NAME_BOUNDARY_LIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*名称|项目名称|金额|税额").expect("valid regex"));

/// All 名称 values in document order. A 名称 occurrence embedded in 项目名称
/// also counts, matching the line-oriented receipts this targets, where the
/// project label follows both party names.
pub(crate) fn extract_names(text: &str) -> Vec<String> {
    let names = bounded_captures(text, &NAME_LABEL_RE, &NAME_BOUNDARY_RE);
    if !names.is_empty() {
        return names;
    }
    bounded_captures(text, &NAME_LABEL_LIT_RE, &NAME_BOUNDARY_LIT_RE)
}

static PROJECT_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{}\s*[：:\s]*", key_pattern("项目名称"))).expect("valid regex"));
static PROJECT_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"名\s*称|金\s*额|税\s*额|规格|单位|数量|单价").expect("valid regex"));
static PROJECT_LABEL_LIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"项目名称[：:\s]*").expect("valid regex"));
static PROJECT_BOUNDARY_LIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*名称|金额|税额").expect("valid regex"));

/// Project name, bounded by the next field label or a table column header
/// (规格, 单位, 数量, 单价).
pub(crate) fn extract_project_name(text: &str) -> Option<String> {
    bounded_captures(text, &PROJECT_LABEL_RE, &PROJECT_BOUNDARY_RE)
        .into_iter()
        .next()
        .or_else(|| {
            bounded_captures(text, &PROJECT_LABEL_LIT_RE, &PROJECT_BOUNDARY_LIT_RE)
                .into_iter()
                .next()
        })
}

static AMOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"{}\s*[：:\s]*([\d.￥元\s,，]+)", key_pattern("金额")),
        // 金,额 with a stray separator the engine hallucinated between glyphs.
        r"金\s*[,，]?\s*额\s*[：:\s]*([\d.￥元\s,，]+)".to_string(),
        r"金额[：:\s]*([\d.￥元\s,，]+)".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Amount from the full text. The first pattern whose capture matches decides
/// the outcome, even when that capture does not normalize to a number.
pub(crate) fn extract_amount(text: &str) -> Option<f64> {
    first_capture(&AMOUNT_PATTERNS, text).and_then(|v| normalize_amount(&v))
}

static TAX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"{}\s*[：:\s]*([\d.￥元\s,，]+)", key_pattern("税额")),
        // 税领 with 额 misread as 领.
        r"税\s*[额领]\s*[：:\s]*([\d.￥元\s,，]+)".to_string(),
        r"税额[：:\s]*([\d.￥元\s,，]+)".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

pub(crate) fn extract_tax(text: &str) -> Option<f64> {
    first_capture(&TAX_PATTERNS, text).and_then(|v| normalize_amount(&v))
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    for re in patterns {
        if let Some(caps) = re.captures(text)
            && let Some(m) = caps.get(1)
            && !m.as_str().is_empty()
        {
            return Some(m.as_str().trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_with_split_label() {
        assert_eq!(
            extract_invoice_number("发 票 号 码 ： 12345678901234"),
            Some("12345678901234".to_string())
        );
    }

    #[test]
    fn invoice_number_prefers_digits() {
        assert_eq!(
            extract_invoice_number("发票号码：No12345"),
            Some("No12345".to_string())
        );
        assert_eq!(
            extract_invoice_number("号码 987654"),
            Some("987654".to_string())
        );
    }

    #[test]
    fn invoice_date_both_forms() {
        assert_eq!(
            extract_invoice_date("开票日期：2024年1月5日"),
            Some("2024年1月5日".to_string())
        );
        assert_eq!(
            extract_invoice_date("开 票 日 期 2024/3/15"),
            Some("2024/3/15".to_string())
        );
    }

    #[test]
    fn names_in_document_order() {
        let text = "名称：宝山钢铁股份有限公司 金额\n名称：上海贸易有限公司 税额";
        assert_eq!(
            extract_names(text),
            vec!["宝山钢铁股份有限公司", "上海贸易有限公司"]
        );
    }

    #[test]
    fn name_not_followed_by_boundary_on_its_line_is_skipped() {
        // The value runs to a newline with no boundary label, and more text
        // follows; no capture can close, so the occurrence yields nothing.
        let text = "名称：宝山钢铁股份有限公司\n其他内容";
        assert!(extract_names(text).is_empty());
    }

    #[test]
    fn name_value_running_to_end_of_input() {
        assert_eq!(extract_names("名称：宝山钢铁"), vec!["宝山钢铁"]);
    }

    #[test]
    fn project_name_stops_at_column_header() {
        assert_eq!(
            extract_project_name("项目名称：钢材加工费 规格 单位"),
            Some("钢材加工费".to_string())
        );
    }

    #[test]
    fn project_name_stops_at_next_field_label() {
        assert_eq!(
            extract_project_name("项 目 名 称 ： 咨询服务 金额 100.00"),
            Some("咨询服务".to_string())
        );
    }

    #[test]
    fn amount_and_tax_with_currency_noise() {
        assert_eq!(extract_amount("金额：￥ 408.17 元"), Some(408.17));
        assert_eq!(extract_tax("税 领 53.06"), Some(53.06));
    }

    #[test]
    fn amount_first_pattern_decides_even_when_not_numeric() {
        // The capture class matches a lone currency glyph; normalization
        // fails and no later pattern is consulted.
        assert_eq!(extract_amount("金额：￥"), None);
    }

    #[test]
    fn fullwidth_comma_amount() {
        assert_eq!(extract_amount("金额：408，17"), Some(408.17));
    }

    #[test]
    fn missing_fields_yield_none() {
        assert_eq!(extract_invoice_number("没有相关字段"), None);
        assert_eq!(extract_invoice_date("没有相关字段"), None);
        assert_eq!(extract_project_name("没有相关字段"), None);
        assert_eq!(extract_amount("没有相关字段"), None);
        assert_eq!(extract_tax("没有相关字段"), None);
    }

    #[test]
    fn bounded_capture_skips_empty_values() {
        let label = Regex::new(r"名\s*称\s*[：:\s]*").unwrap();
        let boundary = Regex::new(r"金\s*额").unwrap();
        assert!(bounded_captures("名称：金额 100", &label, &boundary)
            .first()
            .is_none_or(|v| !v.is_empty()));
    }
}
