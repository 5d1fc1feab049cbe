//! Aggregated field validation.
//!
//! All checks run over the assembled fields and every failure is collected
//! before reporting, so a caller sees the complete picture in one pass
//! instead of fixing violations one at a time.

use crate::core::{ValidationReport, Violation};
use crate::domain::{EvidenceMap, Receipt, ReceiptFields};

fn collect_violations(fields: &ReceiptFields) -> Vec<Violation> {
    let mut violations = Vec::new();

    match fields.invoice_number.as_deref().map(str::trim) {
        None | Some("") => violations.push(Violation::MissingInvoiceNumber),
        Some(n) if !n.chars().all(|c| c.is_ascii_digit()) => {
            violations.push(Violation::InvoiceNumberNotDigits)
        }
        Some(_) => {}
    }

    if fields.invoice_date.is_none() {
        violations.push(Violation::MissingInvoiceDate);
    }

    let found = [&fields.name1, &fields.name2]
        .iter()
        .filter(|n| n.as_deref().is_some_and(|v| !v.trim().is_empty()))
        .count();
    if found != 2 {
        violations.push(Violation::NameCount { found });
    }

    if fields
        .project_name
        .as_deref()
        .is_none_or(|p| p.trim().is_empty())
    {
        violations.push(Violation::MissingProjectName);
    }

    if fields.amount.filter(|a| a.is_finite()).is_none() {
        violations.push(Violation::MissingAmount);
    }
    if fields.tax.filter(|t| t.is_finite()).is_none() {
        violations.push(Violation::MissingTax);
    }

    violations
}

/// Checks the assembled fields, collecting every violation before failing.
pub fn validate(fields: &ReceiptFields) -> Result<(), ValidationReport> {
    let violations = collect_violations(fields);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport::new(violations))
    }
}

impl Receipt {
    /// Validates the fields and, when complete, freezes them into a receipt
    /// together with their pixel evidence.
    pub fn from_fields(
        fields: ReceiptFields,
        evidence: EvidenceMap,
    ) -> Result<Receipt, ValidationReport> {
        validate(&fields)?;
        // Validation guarantees every unwrap_or_default below is unreachable.
        Ok(Receipt {
            invoice_number: fields
                .invoice_number
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            invoice_date: fields.invoice_date.unwrap_or_default(),
            name1: fields.name1.map(|v| v.trim().to_string()).unwrap_or_default(),
            name2: fields.name2.map(|v| v.trim().to_string()).unwrap_or_default(),
            project_name: fields
                .project_name
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            amount: fields.amount.unwrap_or_default(),
            tax: fields.tax.unwrap_or_default(),
            evidence,
        })
    }
}
