//! Session events
//!
//! Channel-friendly mirror of the [`PlayerObserver`] callbacks for UIs that
//! prefer to consume state changes from a queue rather than implement the
//! observer trait.

use std::sync::Arc;

use cadenza_core::PlayableItem;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::{observer::PlayerObserver, types::PlaybackNotice};

/// Events emitted by the player session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A new item became current
    SongSelected {
        /// The selected item
        item: PlayableItem,
        /// Its catalog index
        index: usize,
    },

    /// Playing flag changed
    PlaybackStateChanged {
        /// Whether audio is (meant to be) playing
        playing: bool,
    },

    /// Message for the user
    Notice(PlaybackNotice),
}

/// Observer that forwards every callback onto a channel
pub struct ChannelObserver {
    tx: Sender<SessionEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    pub fn new() -> (Arc<Self>, Receiver<SessionEvent>) {
        let (tx, rx) = unbounded();
        (Arc::new(Self { tx }), rx)
    }

    /// Wrap an existing sender
    pub fn with_sender(tx: Sender<SessionEvent>) -> Arc<Self> {
        Arc::new(Self { tx })
    }

    fn send(&self, event: SessionEvent) {
        // Receiver dropped: the UI went away, nothing to do
        self.tx.send(event).ok();
    }
}

impl PlayerObserver for ChannelObserver {
    fn on_song_selected(&self, item: &PlayableItem, index: usize) {
        self.send(SessionEvent::SongSelected {
            item: item.clone(),
            index,
        });
    }

    fn on_playback_state_changed(&self, playing: bool) {
        self.send(SessionEvent::PlaybackStateChanged { playing });
    }

    fn on_notice(&self, notice: &PlaybackNotice) {
        self.send(SessionEvent::Notice(notice.clone()));
    }
}
