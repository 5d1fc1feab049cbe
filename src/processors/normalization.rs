//! Value canonicalization for OCR-extracted field text.
//!
//! OCR output is noisy: spaces appear inside numbers, the decimal separator
//! may arrive as a half- or full-width comma, and dates come in three layouts.
//! The normalizers here turn that text into deterministic canonical values.
//!
//! # Compatibility note
//!
//! [`normalize_amount`] treats **both** comma forms as the decimal point, not
//! as thousands separators: `"408，17"` becomes `408.17`, and a Western
//! thousands-grouped string like `"1,234.56"` becomes `1.234` (the comma is
//! blindly replaced with `.`, and only the leading numeric prefix of
//! `"1.234.56"` parses). This is intentional and must be preserved — existing
//! recognized output depends on it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading numeric prefix, matching what `parseFloat` would consume.
static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)").expect("valid regex"));

/// `YYYY年M月D日` with arbitrary internal whitespace; the 日 marker is optional.
static DATE_CN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日?").expect("valid regex")
});

/// `YYYY-M-D` anchored at the start of the (trimmed) input.
static DATE_DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid regex"));

/// `YYYY/M/D` anchored at the start of the (trimmed) input.
static DATE_SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})").expect("valid regex"));

/// Removes all whitespace, so `"发 票 号 码"` matches the label `"发票号码"`.
pub fn strip_spaces(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes an amount string to a finite number.
///
/// Strips currency decoration (`￥`, `元`) and whitespace, replaces `,` and
/// `，` with `.`, then parses the longest leading numeric prefix. Returns
/// `None` when nothing numeric remains or the result is not finite.
pub fn normalize_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .map(|c| if c == ',' || c == '，' { '.' } else { c })
        .filter(|c| !matches!(c, '￥' | '元') && !c.is_whitespace())
        .collect();
    let m = LEADING_NUMBER_RE.find(&cleaned)?;
    let value: f64 = m.as_str().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Normalizes a date string to zero-padded `YYYY-MM-DD`.
///
/// Recognized forms, tried in order: `YYYY年M月D日`, `YYYY-M-D`, `YYYY/M/D`.
/// Anything else yields `None` — callers treat that as "not yet extracted",
/// not as an error.
pub fn normalize_date(s: &str) -> Option<String> {
    let s = s.trim();
    for re in [&*DATE_CN_RE, &*DATE_DASH_RE, &*DATE_SLASH_RE] {
        if let Some(caps) = re.captures(s) {
            return Some(format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3]));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_parses_simple_decimals() {
        assert_eq!(normalize_amount("123.45"), Some(123.45));
        assert_eq!(normalize_amount("0"), Some(0.0));
        assert_eq!(normalize_amount("408.17"), Some(408.17));
    }

    #[test]
    fn amount_is_idempotent_on_canonical_input() {
        assert_eq!(normalize_amount("123.45"), Some(123.45));
        assert_eq!(normalize_amount("123.45"), Some(123.45));
    }

    #[test]
    fn amount_treats_comma_as_decimal_point() {
        // Deliberate quirk: comma is replaced with '.', so a Western
        // thousands-grouped string truncates at the second separator.
        assert_eq!(normalize_amount("1,234.56"), Some(1.234));
        assert_eq!(normalize_amount("408，17"), Some(408.17));
    }

    #[test]
    fn amount_strips_currency_and_spaces() {
        assert_eq!(normalize_amount("￥ 408.17"), Some(408.17));
        assert_eq!(normalize_amount("408 元"), Some(408.0));
        assert_eq!(normalize_amount("408. 17"), Some(408.17));
    }

    #[test]
    fn amount_rejects_empty_and_non_numeric() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount("  "), None);
        assert_eq!(normalize_amount("￥元"), None);
    }

    #[test]
    fn date_normalizes_chinese_markers() {
        assert_eq!(normalize_date("2024年1月5日"), Some("2024-01-05".to_string()));
        assert_eq!(
            normalize_date("2024 年 12 月 31 日"),
            Some("2024-12-31".to_string())
        );
        // The 日 marker is optional.
        assert_eq!(normalize_date("2024年1月5"), Some("2024-01-05".to_string()));
    }

    #[test]
    fn date_normalizes_dash_and_slash() {
        assert_eq!(normalize_date("2024-01-05"), Some("2024-01-05".to_string()));
        assert_eq!(normalize_date("2024-1-5"), Some("2024-01-05".to_string()));
        assert_eq!(normalize_date("2024/01/05"), Some("2024-01-05".to_string()));
        assert_eq!(normalize_date("2024/1/5"), Some("2024-01-05".to_string()));
    }

    #[test]
    fn date_rejects_unrecognized_forms() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("not a date"), None);
        // Day-first Western layout is not a recognized form.
        assert_eq!(normalize_date("01/05/2024"), None);
    }

    #[test]
    fn strip_spaces_removes_fullwidth_whitespace_too() {
        assert_eq!(strip_spaces("发 票\u{3000}号 码"), "发票号码");
    }

    #[test]
    fn collapse_spaces_trims_and_joins() {
        assert_eq!(collapse_spaces("  a   b \t c "), "a b c");
    }
}
