//! Error types for Pagecast.

use thiserror::Error;

/// Main error type for Pagecast operations.
#[derive(Error, Debug)]
pub enum PagecastError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected before any work starts.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Failed to render page {page}: {message}")]
    Render { page: usize, message: String },

    #[error("Failed to encode page {page}: {message}")]
    Encode {
        page: usize,
        message: String,
        stderr: Option<String>,
    },

    /// A result slot was still empty after both stages drained.
    #[error("page {page} not produced")]
    MissingSegment { page: usize },

    /// Final concatenation failed. `stderr` carries the encoder's diagnostics verbatim.
    #[error("Assembly failed: {message}{}", stderr.as_deref().map(|s| format!("\n{s}")).unwrap_or_default())]
    Assembly {
        message: String,
        stderr: Option<String>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Image error: {0}")]
    Image(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Required tool not found: {0}")]
    ToolMissing(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PagecastError {
    /// True when the run stopped because the cancel token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias for Pagecast operations.
pub type Result<T> = std::result::Result<T, PagecastError>;
