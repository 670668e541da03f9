//! Error types for the BioAge engine

use thiserror::Error;

/// Errors that can occur during computation
///
/// Missing data is never an error: absent metrics simply drop their domain
/// out of the blend. Only inputs that make the computation meaningless are
/// rejected.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid chronological age: {0} (must be finite and > 0)")]
    InvalidChronologicalAge(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse request: {0}")]
    ParseError(String),
}
