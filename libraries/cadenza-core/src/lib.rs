//! Cadenza Core
//!
//! Platform-agnostic domain types and collaborator traits for Cadenza.
//!
//! This crate provides the building blocks shared by the playback
//! coordination layer and by platform integrations.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `PlayableItem`, `ItemId`, `ContentLocator`
//! - **Collaborator Traits**: `Catalog`, `MediaBackend`, `Decoder`, `AudioFocus`
//! - **Platform Events**: `DecoderEvent`, `FocusChange` and the sinks platforms
//!   use to deliver them asynchronously
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::{Catalog, ContentLocator, InMemoryCatalog, ItemId, PlayableItem};
//!
//! let item = PlayableItem::new(
//!     ItemId::new(1),
//!     "Intro",
//!     "Some Artist",
//!     "Some Album",
//!     200_000,
//!     ContentLocator::new("content://media/external/audio/media/1"),
//! );
//!
//! let catalog = InMemoryCatalog::new(vec![item]);
//! assert_eq!(catalog.all_items().len(), 1);
//! assert_eq!(catalog.all_items()[0].formatted_duration(), "3:20");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use events::{DecoderEvent, DecoderEventSink, FocusChange, FocusEventSink, PlatformEvent};
pub use traits::{AudioFocus, Catalog, Decoder, FocusRequest, InMemoryCatalog, MediaBackend};
pub use types::{ContentLocator, ItemId, PlayableItem};
