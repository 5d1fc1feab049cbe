//! Text extraction pipeline.
//!
//! ## Stage Definition
//!
//! Input: the engine's full recognized text plus its line output (possibly
//! empty when only plain text is available).
//!
//! Stages, in order:
//! 1. Layout association binds values to labeled lines and runs the
//!    amount-column geometry (`layout`, `column`).
//! 2. The whitespace-tolerant regex fallback fills anything the layout pass
//!    left unset (`fallback`).
//! 3. The invoice date is normalized to `YYYY-MM-DD`.
//! 4. Validation collects every violation before failing (`validate`).
//! 5. Fallback-sourced values are reconciled back to line boxes
//!    (`reconcile`).
//!
//! Output: a validated [`Receipt`], or [`ExtractError::Validation`] carrying
//! the full report. [`extract_partial`] runs the same assembly without the
//! validation gate and keeps whatever was found.

mod column;
mod fallback;
mod layout;
mod reconcile;
mod validate;

pub use validate::validate;

use crate::core::ExtractError;
use crate::domain::{EvidenceMap, OcrLine, Receipt, ReceiptFields};
use crate::processors::normalization::normalize_date;

fn layout_pass(lines: &[OcrLine]) -> (ReceiptFields, EvidenceMap) {
    if lines.is_empty() {
        (ReceiptFields::default(), EvidenceMap::new())
    } else {
        layout::extract_from_lines(lines)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Extracts and validates all receipt fields.
///
/// `lines` may be empty; the pipeline then runs on `text` alone and the
/// receipt ships without pixel evidence.
pub fn parse(text: &str, lines: &[OcrLine]) -> Result<Receipt, ExtractError> {
    let (layout, mut evidence) = layout_pass(lines);

    let invoice_number = layout
        .invoice_number
        .or_else(|| fallback::extract_invoice_number(text));
    let invoice_date = layout
        .invoice_date
        .or_else(|| fallback::extract_invoice_date(text))
        .and_then(|raw| normalize_date(&raw));

    // When layout association produced both names, the fallback scan is
    // skipped entirely; otherwise layout values win their slot.
    let (name1, name2) = match (layout.name1, layout.name2) {
        (Some(n1), Some(n2)) => (Some(n1), Some(n2)),
        (n1, n2) => {
            let names = fallback::extract_names(text);
            (
                n1.or_else(|| names.first().cloned()),
                n2.or_else(|| names.get(1).cloned()),
            )
        }
    };

    let project_name = layout
        .project_name
        .or_else(|| fallback::extract_project_name(text));
    let amount = layout.amount.or_else(|| fallback::extract_amount(text));
    let tax = layout.tax.or_else(|| fallback::extract_tax(text));

    let fields = ReceiptFields {
        invoice_number: trimmed(invoice_number),
        invoice_date,
        name1: trimmed(name1),
        name2: trimmed(name2),
        project_name: trimmed(project_name),
        amount,
        tax,
    };

    reconcile::assign_evidence_from_lines(lines, &fields, &mut evidence);
    let receipt = Receipt::from_fields(fields, evidence).map_err(ExtractError::Validation)?;
    tracing::debug!(
        target: "extract",
        evidence_fields = receipt.evidence.len(),
        "receipt fields extracted and validated"
    );
    Ok(receipt)
}

/// Runs the same assembly as [`parse`] without the validation gate.
///
/// Missing fields stay `None`; whatever was found is reconciled against the
/// line output for evidence. Used when a caller wants best-effort results
/// from degraded scans.
pub fn extract_partial(text: &str, lines: &[OcrLine]) -> (ReceiptFields, EvidenceMap) {
    let (layout, mut evidence) = layout_pass(lines);

    let names = fallback::extract_names(text);
    let fields = ReceiptFields {
        invoice_number: trimmed(
            layout
                .invoice_number
                .or_else(|| fallback::extract_invoice_number(text)),
        )
        .filter(|v| !v.is_empty()),
        invoice_date: layout
            .invoice_date
            .or_else(|| fallback::extract_invoice_date(text))
            .and_then(|raw| normalize_date(&raw)),
        name1: trimmed(layout.name1.or_else(|| names.first().cloned())),
        name2: trimmed(layout.name2.or_else(|| names.get(1).cloned())),
        project_name: trimmed(
            layout
                .project_name
                .or_else(|| fallback::extract_project_name(text)),
        )
        .filter(|v| !v.is_empty()),
        amount: layout.amount.or_else(|| fallback::extract_amount(text)),
        tax: layout.tax.or_else(|| fallback::extract_tax(text)),
    };

    reconcile::assign_evidence_from_lines(lines, &fields, &mut evidence);
    (fields, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExtractError;
    use crate::domain::FieldKey;
    use crate::processors::geometry::BoundingBox;

    fn line(text: &str, y: f32) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            bbox: Some(BoundingBox::new(0.0, y, 200.0, y + 12.0)),
            words: Vec::new(),
        }
    }

    fn receipt_lines() -> Vec<OcrLine> {
        vec![
            line("发票号码: 12345678901234", 0.0),
            line("开票日期：2024年1月5日", 14.0),
            line("名称：宝山钢铁股份有限公司", 28.0),
            line("名称：上海贸易有限公司", 42.0),
            line("项目名称：钢材加工费 规格", 56.0),
            line("金额：408.17", 70.0),
            line("税额：53.06", 84.0),
        ]
    }

    fn joined(lines: &[OcrLine]) -> String {
        lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn full_receipt_parses_end_to_end() {
        let lines = receipt_lines();
        let receipt = parse(&joined(&lines), &lines).unwrap();
        assert_eq!(receipt.invoice_number, "12345678901234");
        assert_eq!(receipt.invoice_date, "2024-01-05");
        assert_eq!(receipt.name1, "宝山钢铁股份有限公司");
        assert_eq!(receipt.name2, "上海贸易有限公司");
        assert_eq!(receipt.project_name, "钢材加工费");
        assert_eq!(receipt.amount, 408.17);
        assert_eq!(receipt.tax, 53.06);
        // Every field was label-bound, so every field carries evidence.
        for key in FieldKey::ALL {
            assert!(receipt.evidence.contains_key(&key), "no evidence for {key}");
        }
    }

    #[test]
    fn text_only_input_parses_without_evidence() {
        // With no line output the name scan needs the next label on the same
        // text line to close each capture.
        let text = "发票号码: 12345678901234\n开票日期：2024年1月5日\n\
                    名称：宝山钢铁股份有限公司 名称：上海贸易有限公司 项目名称：钢材加工费 规格\n\
                    金额：408.17\n税额：53.06";
        let receipt = parse(text, &[]).unwrap();
        assert_eq!(receipt.invoice_number, "12345678901234");
        assert_eq!(receipt.invoice_date, "2024-01-05");
        assert_eq!(receipt.name1, "宝山钢铁股份有限公司");
        assert_eq!(receipt.name2, "上海贸易有限公司");
        assert_eq!(receipt.project_name, "钢材加工费");
        assert!(receipt.evidence.is_empty());
    }

    #[test]
    fn validation_failure_reports_every_gap() {
        let err = parse("无关紧要的文本", &[]).unwrap_err();
        let ExtractError::Validation(report) = err else {
            panic!("expected a validation report");
        };
        assert_eq!(report.violations().len(), 6);
        let rendered = report.to_string();
        assert!(rendered.contains("发票号码"));
        assert!(rendered.contains("Expected 2 名称, found 0"));
    }

    #[test]
    fn unparseable_date_becomes_a_violation() {
        let mut lines = receipt_lines();
        lines[1] = line("开票日期：2024第一季度", 14.0);
        let err = parse(&joined(&lines), &lines).unwrap_err();
        let ExtractError::Validation(report) = err else {
            panic!("expected a validation report");
        };
        assert_eq!(report.details(), vec!["开票日期"]);
    }

    #[test]
    fn slash_date_is_normalized() {
        let mut lines = receipt_lines();
        lines[1] = line("开票日期：2024/3/15", 14.0);
        let receipt = parse(&joined(&lines), &lines).unwrap();
        assert_eq!(receipt.invoice_date, "2024-03-15");
    }

    #[test]
    fn layout_names_override_fallback_slots() {
        // Layout sees one name line; the second slot comes from the text
        // scan while the first keeps the layout value.
        let lines = vec![
            line("发票号码: 12345678901234", 0.0),
            line("开票日期：2024-01-05", 14.0),
            line("名称：宝山钢铁股份有限公司 金额", 28.0),
            line("金额：408.17", 70.0),
            line("税额：53.06", 84.0),
        ];
        let text = format!(
            "{}\n名称：上海贸易有限公司 税额\n项目名称：钢材加工费 规格",
            joined(&lines)
        );
        let receipt = parse(&text, &lines).unwrap();
        assert_eq!(receipt.name1, "宝山钢铁股份有限公司");
        assert_eq!(receipt.name2, "上海贸易有限公司");
        assert_eq!(receipt.project_name, "钢材加工费");
    }

    #[test]
    fn fallback_values_gain_evidence_through_reconciliation() {
        // The amount line carries no label the layout pass recognizes, so the
        // value comes from the text scan and is reconciled to its line.
        let lines = vec![
            line("发票号码: 12345678901234", 0.0),
            line("开票日期：2024-01-05", 14.0),
            line("名称：宝山钢铁股份有限公司 名称：上海贸易有限公司", 28.0),
            line("项目名称：钢材加工费 单位", 56.0),
            line("价税合计 408.17", 70.0),
            line("税额：53.06", 84.0),
        ];
        let text = format!("{}\n金额：408.17", joined(&lines));
        let receipt = parse(&text, &lines).unwrap();
        assert_eq!(receipt.amount, 408.17);
        assert_eq!(
            receipt.evidence.get(&FieldKey::Amount),
            Some(&BoundingBox::new(0.0, 70.0, 200.0, 82.0))
        );
    }

    #[test]
    fn extract_partial_keeps_what_it_finds() {
        let (fields, evidence) =
            extract_partial("发票号码：88888888\n金额：100.00 元", &[]);
        assert_eq!(fields.invoice_number.as_deref(), Some("88888888"));
        assert_eq!(fields.amount, Some(100.0));
        assert_eq!(fields.invoice_date, None);
        assert_eq!(fields.project_name, None);
        assert!(evidence.is_empty());
    }

    #[test]
    fn extract_partial_reconciles_evidence() {
        let lines = vec![line("发票号码：88888888", 0.0)];
        let (fields, evidence) = extract_partial(&joined(&lines), &lines);
        assert_eq!(fields.invoice_number.as_deref(), Some("88888888"));
        assert!(evidence.contains_key(&FieldKey::InvoiceNumber));
    }
}
