//! Error types for strokeprint

use crate::validator::ValidationError;
use thiserror::Error;

/// Errors that can occur at the engine's fallible boundaries.
///
/// Feature extraction and comparison themselves never fail; these errors come
/// from parsing, validation, configuration, and persistence.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse capture payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid capture: {0}")]
    InvalidCapture(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Enrollment session not found or expired: {0}")]
    EnrollmentSessionNotFound(String),

    #[error("External comparator failed: {0}")]
    ExternalComparator(String),
}
