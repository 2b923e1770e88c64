//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Unexpected status {status} from {method} {url}")]
    Status {
        method: String,
        url: String,
        status: u16,
    },

    #[error("WebDriver error: {error} - {message}")]
    WebDriver { error: String, message: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] entityqa_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<entityqa_common::ValidationError> for E2eError {
    fn from(e: entityqa_common::ValidationError) -> Self {
        E2eError::Common(e.into())
    }
}

impl From<entityqa_common::IdentityMismatch> for E2eError {
    fn from(e: entityqa_common::IdentityMismatch) -> Self {
        E2eError::Common(e.into())
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Fail with `AssertionFailed` unless `cond` holds
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::E2eError::AssertionFailed(format!($($arg)+)));
        }
    };
}
