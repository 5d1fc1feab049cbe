//! Per-region recognition orchestrator.
//!
//! ## Stage Definition
//!
//! Input: a decoded page image and a complete [`RegionSet`].
//!
//! Each region is cropped, cleaned and recognized independently. Region
//! recognitions run concurrently under one overall time budget. A failure in
//! one region leaves that field unset and never fails the call; only an
//! exhausted budget aborts the whole extraction, since partial results from
//! a stalled engine are not trustworthy.
//!
//! Output: best-effort [`ReceiptFields`] plus the mapped pixel box of every
//! region as overlay evidence.

use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use tokio::task::JoinSet;

use crate::core::ExtractError;
use crate::domain::{EvidenceMap, FieldKey, ReceiptFields};
use crate::engine::OcrEngine;
use crate::processors::normalization::{normalize_amount, normalize_date, strip_spaces};
use crate::regions::crop;
use crate::regions::RegionSet;

/// Best-effort region extraction output.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionExtraction {
    pub fields: ReceiptFields,
    pub evidence: EvidenceMap,
}

/// Drives one engine over the regions of a page.
pub struct RegionExtractor {
    engine: Arc<dyn OcrEngine>,
    budget: Duration,
}

impl RegionExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, budget: Duration) -> Self {
        Self { engine, budget }
    }

    /// Recognizes every region of `page` and assembles the fields.
    ///
    /// Returns [`ExtractError::EngineUnavailable`] when the overall budget
    /// expires before all regions report; in-flight recognitions are aborted
    /// and nothing partial is kept.
    pub async fn extract(
        &self,
        page: &RgbImage,
        regions: &RegionSet,
    ) -> Result<RegionExtraction, ExtractError> {
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return Err(ExtractError::invalid_input(
                "page image has no readable dimensions",
            ));
        }
        let evidence = regions.pixel_boxes(width, height);

        // Crops are cheap and deterministic; prepare them up front so only
        // engine calls spend the budget.
        let mut jobs = Vec::new();
        for key in FieldKey::ALL {
            let bbox = regions.pixel_box(key, width, height);
            match crop::prepare_region(page, &bbox) {
                Ok(png) => jobs.push((key, png)),
                Err(e) => {
                    tracing::warn!(
                        target: "regions",
                        field = %key,
                        error = %e,
                        "region crop failed, leaving field unset"
                    );
                }
            }
        }

        let mut tasks = JoinSet::new();
        for (key, png) in jobs {
            let engine = Arc::clone(&self.engine);
            tasks.spawn(async move { (key, engine.recognize(&png).await) });
        }

        let mut fields = ReceiptFields::default();
        let deadline = tokio::time::sleep(self.budget);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((key, Ok(raw)))) => assign(&mut fields, key, &raw.text),
                    Some(Ok((key, Err(e)))) => {
                        tracing::warn!(
                            target: "regions",
                            field = %key,
                            error = %e,
                            "region recognition failed, leaving field unset"
                        );
                    }
                    Some(Err(e)) => {
                        tracing::warn!(target: "regions", error = %e, "region task aborted");
                    }
                },
                _ = &mut deadline => {
                    tasks.abort_all();
                    return Err(ExtractError::engine_unavailable(format!(
                        "region recognition exceeded {:?} budget",
                        self.budget
                    )));
                }
            }
        }

        Ok(RegionExtraction { fields, evidence })
    }
}

/// Folds one region's recognized text into its field, with per-field
/// cleanup. Empty or unusable text leaves the field unset.
fn assign(fields: &mut ReceiptFields, key: FieldKey, text: &str) {
    let raw = strip_spaces(text.trim());
    match key {
        FieldKey::InvoiceNumber => {
            // The crop often re-captures the label; keep digits only.
            let digits: String = raw
                .replace("发票号码", "")
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            if !digits.is_empty() {
                fields.invoice_number = Some(digits);
            }
        }
        FieldKey::InvoiceDate => {
            if !raw.is_empty() {
                let normalized = normalize_date(&raw);
                fields.invoice_date = Some(normalized.unwrap_or(raw));
            }
        }
        FieldKey::Name1 | FieldKey::Name2 => {
            let value = raw
                .strip_prefix(['：', ':'])
                .unwrap_or(&raw)
                .to_string();
            if !value.is_empty() {
                match key {
                    FieldKey::Name1 => fields.name1 = Some(value),
                    _ => fields.name2 = Some(value),
                }
            }
        }
        FieldKey::ProjectName => {
            if !raw.is_empty() {
                fields.project_name = Some(raw);
            }
        }
        FieldKey::Amount => {
            let cleaned: String = raw
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '，'))
                .collect();
            fields.amount = normalize_amount(&cleaned);
        }
        FieldKey::Tax => {
            let cleaned: String = raw
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '，'))
                .collect();
            fields.tax = normalize_amount(&cleaned);
        }
    }
}
