//! The core module of the extraction pipeline.
//!
//! Contains the error taxonomy shared by every component. Commonly used types
//! are re-exported at the crate root for convenience.

pub mod errors;

pub use errors::{ExtractError, ValidationReport, Violation};
