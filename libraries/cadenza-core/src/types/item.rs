/// Playable item types
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Opaque handle to media content
///
/// Only the platform media layer knows how to resolve it (a content URI,
/// a file path, a stream URL...). The core never interprets it beyond
/// checking that it is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentLocator(String);

impl ContentLocator {
    /// Create a new locator
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Get the locator as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank locator can never be resolved
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A playable catalog entry
///
/// Created by the catalog and never mutated afterwards. The playback layer
/// shares items through a reference-counted catalog snapshot instead of
/// copying them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableItem {
    /// Unique, stable identifier
    pub id: ItemId,

    /// Item title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Duration from metadata in milliseconds (0 = unknown)
    pub duration_ms: u64,

    /// Where the platform media layer finds the audio
    pub locator: ContentLocator,

    /// Where the platform finds the artwork, if any
    pub artwork: Option<ContentLocator>,
}

impl PlayableItem {
    /// Create a new item without artwork
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration_ms: u64,
        locator: ContentLocator,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration_ms,
            locator,
            artwork: None,
        }
    }

    /// Attach an artwork locator
    #[must_use]
    pub fn with_artwork(mut self, artwork: ContentLocator) -> Self {
        self.artwork = Some(artwork);
        self
    }

    /// Metadata duration, `None` when unknown
    pub fn known_duration_ms(&self) -> Option<u64> {
        (self.duration_ms > 0).then_some(self.duration_ms)
    }

    /// Duration formatted as `m:ss`
    pub fn formatted_duration(&self) -> String {
        let seconds = self.duration_ms / 1000;
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}
