//! Core error types for Cadenza

use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors reported by platform collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The decoder rejected an operation
    #[error("Decoder error: {0}")]
    Decoder(String),

    /// The media backend could not provide a resource
    #[error("Backend error: {0}")]
    Backend(String),

    /// A content locator could not be opened
    #[error("Content not accessible: {0}")]
    Inaccessible(String),
}

impl CoreError {
    /// Create a decoder error
    pub fn decoder(msg: impl Into<String>) -> Self {
        Self::Decoder(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an inaccessible-content error
    pub fn inaccessible(locator: impl Into<String>) -> Self {
        Self::Inaccessible(locator.into())
    }
}
