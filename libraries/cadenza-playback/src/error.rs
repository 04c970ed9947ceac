//! Error types for playback coordination

use cadenza_core::{ContentLocator, CoreError};
use thiserror::Error;

use crate::types::EngineState;

/// Playback errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// Index outside the catalog
    #[error("Invalid index {index} for catalog of {len} items")]
    InvalidIndex { index: usize, len: usize },

    /// Catalog has no items
    #[error("Catalog is empty")]
    CatalogEmpty,

    /// The decoder could not prepare an item
    #[error("Failed to prepare item at index {index}: {} (code {code})", fault_name(.code))]
    PrepareFailure { index: usize, code: i32 },

    /// Audio focus was not granted
    #[error("Audio focus denied")]
    ArbitrationDenied,

    /// The decoder failed while playing
    #[error("Decoder runtime error: {} (code {code})", fault_name(.code))]
    DecoderRuntimeError { code: i32 },

    /// Content locator cannot be opened
    #[error("Content not accessible: {0}")]
    ResourceUnavailable(ContentLocator),

    /// No decoder is loaded
    #[error("No item loaded")]
    NoDecoderLoaded,

    /// Operation not legal in the current engine state
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: EngineState,
    },

    /// Platform collaborator failure
    #[error("Backend error: {0}")]
    Backend(#[from] CoreError),

    /// The engine thread has shut down
    #[error("Playback engine is not running")]
    EngineUnavailable,

    /// The engine thread did not answer in time
    #[error("Playback engine did not respond within {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// A worker thread could not be started
    #[error("Failed to spawn {name} thread: {reason}")]
    ThreadSpawn { name: &'static str, reason: String },
}

impl PlaybackError {
    /// Validation errors are absorbed at the session boundary
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidIndex { .. } | Self::CatalogEmpty)
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Readable name for a platform decoder error code
pub fn decoder_fault_name(code: i32) -> &'static str {
    match code {
        1 => "Unknown error",
        100 => "Media server died",
        200 => "Not valid for progressive playback",
        -1004 => "IO error",
        -1007 => "Malformed media",
        -1010 => "Unsupported media",
        -110 => "Timed out",
        _ => "Unrecognized decoder error",
    }
}

fn fault_name(code: &i32) -> &'static str {
    decoder_fault_name(*code)
}
