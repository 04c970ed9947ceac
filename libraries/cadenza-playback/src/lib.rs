//! Cadenza - Playback Coordination
//!
//! Platform-agnostic playback coordination for Cadenza.
//!
//! This crate provides:
//! - A player session holding the authoritative current song and play/pause flag
//! - Observer fan-out with late-join catch-up
//! - A playback engine driving one platform decoder through its lifecycle
//! - Audio focus arbitration (pause on loss, duck, no auto-resume on gain)
//! - Skip-on-error recovery with a bounded retry budget
//! - Periodic position/duration updates
//!
//! # Architecture
//!
//! `cadenza-playback` never talks to a platform directly. Decoders, audio
//! focus and the media library are reached through the traits in
//! `cadenza-core`. The engine lives on its own thread and is driven through
//! a command channel; decoder callbacks arrive on a second channel.
//!
//! # Example: Session and observers
//!
//! ```rust
//! use cadenza_core::{ContentLocator, ItemId, PlayableItem};
//! use cadenza_playback::{ChannelObserver, PlayerSession, SessionEvent};
//!
//! let session = PlayerSession::detached();
//! session.set_catalog(vec![PlayableItem::new(
//!     ItemId::new(1),
//!     "Intro",
//!     "Some Artist",
//!     "Some Album",
//!     200_000,
//!     ContentLocator::new("file:///music/intro.mp3"),
//! )]);
//!
//! let (observer, events) = ChannelObserver::new();
//! session.register_observer(observer);
//!
//! session.select_song(0);
//! assert_eq!(session.current_index(), Some(0));
//! assert!(matches!(events.try_recv(), Ok(SessionEvent::SongSelected { index: 0, .. })));
//! assert_eq!(
//!     events.try_recv().ok(),
//!     Some(SessionEvent::PlaybackStateChanged { playing: true })
//! );
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use cadenza_core::{AudioFocus, MediaBackend};
//! use cadenza_playback::{Player, PlayerConfig, Result};
//!
//! fn run<B, F>(backend: B, focus: F) -> Result<()>
//! where
//!     B: MediaBackend + 'static,
//!     F: AudioFocus + 'static,
//! {
//!     let player = Player::start(backend, focus, PlayerConfig::default())?;
//!
//!     player.session().select_song(0);
//!     println!("{} ms", player.duration());
//!
//!     player.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod engine;
mod error;
mod events;
mod focus;
pub mod observer;
mod player;
mod poller;
pub mod session;
mod suggest;
pub mod types;

// Public exports
pub use config::PlayerConfig;
pub use driver::{EngineCommand, EngineDriver, EngineHandle, OutcomeSink};
pub use engine::PlaybackEngine;
pub use error::{decoder_fault_name, PlaybackError, Result};
pub use events::{ChannelObserver, SessionEvent};
pub use focus::FocusGuard;
pub use observer::{ObserverRegistry, PlayerObserver};
pub use player::Player;
pub use poller::{ProgressPoller, ProgressSink};
pub use session::PlayerSession;
pub use suggest::{random_suggestions, random_suggestions_with};
pub use types::{EngineOutcome, EngineSnapshot, EngineState, NoticeKind, PlaybackNotice, Progress};
