//! The OCR engine seam.
//!
//! The extraction core never talks to a recognition backend directly; it
//! consumes any engine through this trait object. Latency and availability
//! are outside the core's control, so callers guard invocations with a
//! timeout and treat expiry as a transient service condition
//! ([`crate::ExtractError::EngineUnavailable`]), not a parsing failure.

use crate::core::ExtractError;
use crate::domain::RawOcr;
use async_trait::async_trait;

/// An opaque OCR engine: PNG image bytes in, recognized text out.
///
/// Implementations must be safe to invoke concurrently for independent
/// images; the region-crop orchestrator issues up to seven invocations per
/// document through a shared `Arc<dyn OcrEngine>`.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognizes the text in one image.
    ///
    /// Transport failures should surface as
    /// [`ExtractError::EngineUnavailable`] so that callers can retry;
    /// recognition failures as [`ExtractError::Engine`].
    async fn recognize(&self, image_png: &[u8]) -> Result<RawOcr, ExtractError>;
}
