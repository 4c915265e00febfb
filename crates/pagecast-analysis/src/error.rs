//! Error types for region detection.

use pagecast_core::PagecastError;
use thiserror::Error;

/// Errors that can occur while selecting or running a detector.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The variant is known but has no implementation yet.
    #[error("Detector '{variant}' is not implemented")]
    NotImplemented { variant: &'static str },

    #[error("Unknown detector variant '{name}'")]
    UnknownVariant { name: String },

    /// Buffer length does not match the declared dimensions.
    #[error("Malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },
}

/// Result type alias for detection operations.
pub type DetectResult<T> = std::result::Result<T, DetectError>;

impl From<DetectError> for PagecastError {
    fn from(e: DetectError) -> Self {
        PagecastError::Detection(e.to_string())
    }
}
