//! Error types for the insulin assistant core

use thiserror::Error;

/// Errors reported by the input-validation guards.
///
/// The calculation paths themselves never fail: out-of-window time deltas,
/// negative corrections, and over-reduced doses are clamped rather than
/// raised. Callers are expected to validate inputs before invoking the
/// engine; the guards in [`crate::validation`] implement that contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
}
