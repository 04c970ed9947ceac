//! Collaborator traits for Cadenza
//!
//! Everything platform-specific (the media library, the decoder/output
//! resource, audio focus) is reached through these traits so the playback
//! layer stays platform-agnostic.

use crate::error::Result;
use crate::events::{DecoderEventSink, FocusEventSink};
use crate::types::{ContentLocator, PlayableItem};

/// Source of playable items
///
/// Implemented by the library scanner. The returned list is ordered and may
/// be empty.
pub trait Catalog: Send + Sync {
    /// Get all items in catalog order
    fn all_items(&self) -> Vec<PlayableItem>;
}

/// Catalog backed by a fixed list
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Vec<PlayableItem>,
}

impl InMemoryCatalog {
    /// Create a catalog from a list of items
    pub fn new(items: Vec<PlayableItem>) -> Self {
        Self { items }
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the catalog has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn all_items(&self) -> Vec<PlayableItem> {
        self.items.clone()
    }
}

/// Platform decoder/output resource
///
/// One instance turns one content locator into audible output. Preparation
/// is asynchronous: `prepare_async` returns immediately and the outcome is
/// reported later through the sink installed with `set_event_sink`.
///
/// The engine installs a fresh sink before every `prepare_async` call, so
/// implementations must always report through the most recently installed
/// sink.
pub trait Decoder: Send {
    /// Install the sink used for `Prepared`, `Error` and `Completed` reports
    fn set_event_sink(&mut self, sink: DecoderEventSink);

    /// Start asynchronous preparation of the given content
    ///
    /// # Errors
    /// Returns an error if preparation cannot even be started (the data
    /// source was rejected). Failures discovered later are reported through
    /// the sink instead.
    fn prepare_async(&mut self, locator: &ContentLocator) -> Result<()>;

    /// Start or resume output
    fn start(&mut self) -> Result<()>;

    /// Pause output
    fn pause(&mut self) -> Result<()>;

    /// Stop output
    fn stop(&mut self) -> Result<()>;

    /// Return to the uninitialized state, dropping the data source
    fn reset(&mut self) -> Result<()>;

    /// Release all platform resources; the decoder is unusable afterwards
    fn release(&mut self);

    /// Seek to a position in milliseconds
    fn seek_to(&mut self, position_ms: u64) -> Result<()>;

    /// Current position in milliseconds
    fn current_position(&self) -> u64;

    /// Duration reported by the decoder in milliseconds
    ///
    /// `None` or a value `<= 0` means the decoder does not know.
    fn duration(&self) -> Option<i64>;

    /// Whether output is currently running
    fn is_playing(&self) -> bool;

    /// Set output gain (0.0 - 1.0)
    fn set_volume(&mut self, gain: f32);
}

/// Factory for decoders plus content access checks
pub trait MediaBackend: Send {
    /// Decoder type produced by this backend
    type Decoder: Decoder;

    /// Create a fresh decoder
    ///
    /// # Errors
    /// Returns an error if the platform cannot allocate a decoder.
    fn create_decoder(&mut self) -> Result<Self::Decoder>;

    /// Check that a locator can currently be opened
    fn is_accessible(&self, locator: &ContentLocator) -> bool;
}

/// Outcome of an audio focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequest {
    /// Output may start
    Granted,
    /// Another application holds focus
    Denied,
}

/// Platform audio arbitration
pub trait AudioFocus: Send {
    /// Request permission to produce audio
    ///
    /// Later changes (loss, duck, regain) are reported through `listener`.
    fn request(&mut self, listener: FocusEventSink) -> FocusRequest;

    /// Give the permission back
    fn abandon(&mut self);
}
