//! Error types for EntityQA

use thiserror::Error;

/// Result type alias using the EntityQA common error
pub type Result<T> = std::result::Result<T, Error>;

/// A payload did not match the expected schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("payload does not match {schema}: {message}")]
pub struct ValidationError {
    /// Name of the shape the payload was validated against
    pub schema: &'static str,
    pub message: String,
}

/// The stored top-level `id` differs from the one the caller expected
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Expected ID {expected}, but got {actual}")]
pub struct IdentityMismatch {
    pub expected: i64,
    pub actual: serde_json::Value,
}

/// EntityQA common error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Identity mismatch: {0}")]
    IdentityMismatch(#[from] IdentityMismatch),

    #[error("Invalid post code {0:?}: expected decimal digits")]
    InvalidPostCode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
