//! Amount-column geometry.
//!
//! When word-level boxes are available, the amount and tax values are found
//! geometrically: locate the column header word (e.g. 金额), define a vertical
//! band from its horizontal extent, and take the first amount-shaped word
//! below it inside that band. Line segmentation from the engine is not
//! trusted here — all words are flattened and re-sorted into true reading
//! order before the search.

use crate::domain::{OcrLine, OcrWord};
use crate::processors::geometry::BoundingBox;
use crate::processors::normalization::{normalize_amount, strip_spaces};
use itertools::Itertools;

/// Horizontal margin added on each side of the header word's extent.
const COLUMN_MARGIN: f32 = 5.0;
/// Tolerance subtracted from the header's bottom edge when deciding which
/// words count as "below the header row".
const BELOW_TOLERANCE: f32 = 2.0;

/// Which amount column to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AmountColumn {
    /// The 金额 column.
    Amount,
    /// The 税额 column.
    Tax,
}

impl AmountColumn {
    /// Whether a space-stripped word text is this column's header, including
    /// OCR-degraded variants (a lone first character, or 税领 where the 额
    /// glyph was misread).
    fn is_header(self, norm: &str) -> bool {
        match self {
            AmountColumn::Amount => matches!(norm, "金" | "金额"),
            AmountColumn::Tax => matches!(norm, "税" | "税额" | "税领"),
        }
    }
}

/// A column-geometry hit: the normalized value and its evidence box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ColumnHit {
    pub value: f64,
    pub bbox: BoundingBox,
}

/// An amount-like token: at least one digit, nothing but digits, separators
/// and whitespace, and a finite normalized value.
fn is_amount_like(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ',' | '，' | '.' | '．') || c.is_whitespace())
        && normalize_amount(text).is_some()
}

/// Finds the first amount-shaped word below the given column's header.
///
/// Returns `None` when no line carries words, no header word is found, or no
/// qualifying candidate exists — the regex fallback runs in that case.
pub(crate) fn find_amount_under_column(
    lines: &[OcrLine],
    column: AmountColumn,
) -> Option<ColumnHit> {
    let words: Vec<&OcrWord> = lines
        .iter()
        .flat_map(|line| line.words.iter())
        .sorted_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        })
        .collect();
    if words.is_empty() {
        return None;
    }

    let header = words
        .iter()
        .find(|w| column.is_header(&strip_spaces(&w.text)))?;
    let band_x0 = header.bbox.x0 - COLUMN_MARGIN;
    let band_x1 = header.bbox.x1 + COLUMN_MARGIN;
    let header_bottom = header.bbox.y1;

    // Words are already in reading order, so the first survivor is the
    // nearest qualifying token below the header.
    let chosen = words.iter().find(|w| {
        w.bbox.y0 >= header_bottom - BELOW_TOLERANCE
            && w.bbox.overlaps_x(band_x0, band_x1)
            && is_amount_like(&w.text)
    })?;

    let value = normalize_amount(&chosen.text)?;
    tracing::debug!(
        target: "extract",
        column = ?column,
        value,
        "column geometry selected amount word"
    );
    Some(ColumnHit {
        value,
        bbox: chosen.bbox,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            bbox: BoundingBox::new(x0, y0, x1, y1),
        }
    }

    fn line_with_words(words: Vec<OcrWord>) -> OcrLine {
        OcrLine {
            text: words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" "),
            bbox: None,
            words,
        }
    }

    #[test]
    fn selects_amount_word_under_header() {
        let lines = vec![
            line_with_words(vec![word("金额", 100.0, 10.0, 130.0, 22.0)]),
            line_with_words(vec![word("408.17", 98.0, 40.0, 135.0, 52.0)]),
        ];
        let hit = find_amount_under_column(&lines, AmountColumn::Amount).unwrap();
        assert_eq!(hit.value, 408.17);
        assert_eq!(hit.bbox, BoundingBox::new(98.0, 40.0, 135.0, 52.0));
    }

    #[test]
    fn ignores_amount_outside_column_band() {
        // Amount-shaped and nearer in y, but horizontally outside the band.
        let lines = vec![line_with_words(vec![
            word("金额", 100.0, 10.0, 130.0, 22.0),
            word("999.99", 300.0, 30.0, 340.0, 42.0),
            word("408.17", 98.0, 60.0, 135.0, 72.0),
        ])];
        let hit = find_amount_under_column(&lines, AmountColumn::Amount).unwrap();
        assert_eq!(hit.value, 408.17);
    }

    #[test]
    fn ignores_words_above_or_beside_header() {
        let lines = vec![line_with_words(vec![
            word("123.45", 100.0, 0.0, 130.0, 8.0),
            word("金额", 100.0, 10.0, 130.0, 22.0),
        ])];
        assert_eq!(find_amount_under_column(&lines, AmountColumn::Amount), None);
    }

    #[test]
    fn reading_order_wins_over_line_segmentation() {
        // The nearer value lives on a later line entry; flattening and
        // re-sorting by (y0, x0) must still pick it first.
        let lines = vec![
            line_with_words(vec![word("金额", 100.0, 10.0, 130.0, 22.0)]),
            line_with_words(vec![word("300.00", 99.0, 80.0, 136.0, 92.0)]),
            line_with_words(vec![word("100.50", 99.0, 30.0, 136.0, 42.0)]),
        ];
        let hit = find_amount_under_column(&lines, AmountColumn::Amount).unwrap();
        assert_eq!(hit.value, 100.50);
    }

    #[test]
    fn degraded_header_variants_match() {
        let lines = vec![
            line_with_words(vec![word("税领", 200.0, 10.0, 230.0, 22.0)]),
            line_with_words(vec![word("12.34", 198.0, 40.0, 232.0, 52.0)]),
        ];
        let hit = find_amount_under_column(&lines, AmountColumn::Tax).unwrap();
        assert_eq!(hit.value, 12.34);
    }

    #[test]
    fn no_header_or_no_words_yields_none() {
        assert_eq!(find_amount_under_column(&[], AmountColumn::Amount), None);
        let no_header = vec![line_with_words(vec![word("408.17", 0.0, 0.0, 30.0, 10.0)])];
        assert_eq!(
            find_amount_under_column(&no_header, AmountColumn::Amount),
            None
        );
    }

    #[test]
    fn non_amount_tokens_are_skipped() {
        let lines = vec![line_with_words(vec![
            word("金额", 100.0, 10.0, 130.0, 22.0),
            word("合计", 100.0, 30.0, 130.0, 42.0),
            word("88.00", 100.0, 50.0, 135.0, 62.0),
        ])];
        let hit = find_amount_under_column(&lines, AmountColumn::Amount).unwrap();
        assert_eq!(hit.value, 88.0);
    }
}
