//! Core error types for the extraction pipeline.
//!
//! This module defines the error taxonomy used throughout the crate: malformed
//! input, OCR engine unavailability, and aggregated validation failures.
//! Validation is deliberately not a single-field error — one extraction round
//! produces at most one [`ValidationReport`] enumerating every violation found.

use std::fmt;
use thiserror::Error;

/// A single field violation found while validating an extracted field set.
///
/// The variant order here is the order violations are reported in; the
/// machine-readable list produced by [`ValidationReport::details`] preserves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// 发票号码 is empty after trimming.
    MissingInvoiceNumber,
    /// 发票号码 is present but contains non-digit characters.
    InvoiceNumberNotDigits,
    /// 开票日期 could not be normalized to a date.
    MissingInvoiceDate,
    /// Fewer than two non-empty 名称 values were found.
    NameCount {
        /// How many non-empty names were actually present.
        found: usize,
    },
    /// 项目名称 is empty after trimming.
    MissingProjectName,
    /// 金额 is absent or not a finite number.
    MissingAmount,
    /// 税额 is absent or not a finite number.
    MissingTax,
}

impl Violation {
    /// The human-readable detail string for this violation.
    ///
    /// These strings are stable: user interfaces and tests match on them.
    pub fn detail(&self) -> String {
        match self {
            Violation::MissingInvoiceNumber => "发票号码".to_string(),
            Violation::InvoiceNumberNotDigits => "发票号码 (must be digits)".to_string(),
            Violation::MissingInvoiceDate => "开票日期".to_string(),
            Violation::NameCount { found } => format!("Expected 2 名称, found {found}"),
            Violation::MissingProjectName => "项目名称".to_string(),
            Violation::MissingAmount => "金额".to_string(),
            Violation::MissingTax => "税额".to_string(),
        }
    }

    fn is_header(&self) -> bool {
        matches!(
            self,
            Violation::MissingInvoiceNumber
                | Violation::InvoiceNumberNotDigits
                | Violation::MissingInvoiceDate
        )
    }

    fn is_name_count(&self) -> bool {
        matches!(self, Violation::NameCount { .. })
    }
}

/// Aggregate of all violations found in one validation round.
///
/// Never truncated to the first violation: a field set missing three fields
/// reports all three, so a user can correct each one in a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Creates a report from an ordered list of violations.
    ///
    /// Callers must pass a non-empty list; an empty report is meaningless
    /// (validation success is represented by `Ok(())`).
    pub fn new(violations: Vec<Violation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    /// The individual violations, in report order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// The machine-readable detail strings, in report order.
    pub fn details(&self) -> Vec<String> {
        self.violations.iter().map(Violation::detail).collect()
    }
}

impl fmt::Display for ValidationReport {
    /// Renders the grouped, user-facing message: header violations first,
    /// then the name-count violation, then everything else.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self
            .violations
            .iter()
            .filter(|v| v.is_header())
            .map(Violation::detail)
            .collect();
        let name_count = self.violations.iter().find(|v| v.is_name_count());
        let other: Vec<String> = self
            .violations
            .iter()
            .filter(|v| !v.is_header() && !v.is_name_count())
            .map(Violation::detail)
            .collect();

        let mut parts = Vec::new();
        if !header.is_empty() {
            parts.push(format!(
                "Missing or invalid header (one of each per receipt): {}",
                header.join(", ")
            ));
        }
        if let Some(v) = name_count {
            parts.push(v.detail());
        }
        if !other.is_empty() {
            parts.push(format!("Missing or invalid: {}", other.join(", ")));
        }
        write!(f, "{}", parts.join(". "))
    }
}

/// Errors produced by the extraction pipeline.
///
/// Nothing here is fatal to the host process; every variant is scoped to one
/// document. `EngineUnavailable` is the only transient condition — callers may
/// retry it, unlike the malformed-input and validation rejections.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The caller supplied input the pipeline cannot work with (missing image
    /// dimensions, malformed region configuration, and the like).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// The region configuration document is structurally unusable.
    #[error("region config: {message}")]
    RegionConfig {
        /// A message describing the configuration problem.
        message: String,
    },

    /// The OCR engine did not respond within budget or reported itself down.
    /// Eligible for caller-side retry.
    #[error("ocr engine unavailable: {context}")]
    EngineUnavailable {
        /// What the engine was asked to do when it became unavailable.
        context: String,
    },

    /// A failure inside an OCR engine invocation.
    #[error("ocr engine failed: {context}")]
    Engine {
        /// What the engine was asked to do.
        context: String,
        /// The underlying engine error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error from image decoding or encoding.
    #[error("image processing")]
    Image(#[from] image::ImageError),

    /// The extracted field set violated one or more domain invariants.
    #[error("{0}")]
    Validation(ValidationReport),
}

impl ExtractError {
    /// Creates an invalid-input rejection.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a region-configuration rejection.
    pub fn region_config(message: impl Into<String>) -> Self {
        Self::RegionConfig {
            message: message.into(),
        }
    }

    /// Creates a transient engine-unavailable condition.
    pub fn engine_unavailable(context: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            context: context.into(),
        }
    }

    /// Wraps an error returned by an OCR engine invocation.
    pub fn engine(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Engine {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_groups_header_name_and_other_violations() {
        let report = ValidationReport::new(vec![
            Violation::MissingInvoiceNumber,
            Violation::MissingInvoiceDate,
            Violation::NameCount { found: 1 },
            Violation::MissingAmount,
            Violation::MissingTax,
        ]);
        let msg = report.to_string();
        assert_eq!(
            msg,
            "Missing or invalid header (one of each per receipt): 发票号码, 开票日期. \
             Expected 2 名称, found 1. Missing or invalid: 金额, 税额"
        );
    }

    #[test]
    fn report_details_preserve_order() {
        let report = ValidationReport::new(vec![
            Violation::InvoiceNumberNotDigits,
            Violation::MissingProjectName,
        ]);
        assert_eq!(
            report.details(),
            vec!["发票号码 (must be digits)".to_string(), "项目名称".to_string()]
        );
    }

    #[test]
    fn single_violation_message_has_no_extra_grouping() {
        let report = ValidationReport::new(vec![Violation::MissingProjectName]);
        assert_eq!(report.to_string(), "Missing or invalid: 项目名称");
    }
}
