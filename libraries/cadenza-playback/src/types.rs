//! Core types for playback coordination

use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;

/// Playback engine state
///
/// The index is the catalog position of the item owned by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No decoder work in progress
    Idle,

    /// Waiting for the platform to finish preparing
    Preparing(usize),

    /// Prepared but not producing audio
    Ready(usize),

    /// Producing audio (audio focus held)
    Playing(usize),

    /// Paused mid-track
    Paused(usize),

    /// Last attempt failed; a fresh decoder is ready for the next load
    Error,
}

impl EngineState {
    /// Catalog index the state refers to
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Preparing(i) | Self::Ready(i) | Self::Playing(i) | Self::Paused(i) => Some(i),
            Self::Idle | Self::Error => None,
        }
    }

    /// A prepared decoder is available for start/pause/seek
    pub fn is_loaded(self) -> bool {
        matches!(self, Self::Ready(_) | Self::Playing(_) | Self::Paused(_))
    }

    /// Audio is being produced
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing(_))
    }
}

/// Signal reported by the engine after handling a command or platform event
///
/// The driver forwards these to the session, which turns them into
/// observer notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// Output started for the item at `index`
    Started { index: usize },

    /// Output paused
    Paused { index: usize },

    /// Decoder torn down on request
    Stopped,

    /// Engine moved to another item on its own (completion or skip-on-error)
    Advanced { index: usize },

    /// An item could not be played; the engine recovers by itself
    Failed {
        index: usize,
        error: PlaybackError,
    },

    /// Prepared but not started; caller may retry
    Degraded {
        index: usize,
        error: PlaybackError,
    },

    /// Every item failed within one catalog pass; playback halted
    Halted { attempts: usize },
}

/// Category of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// An item failed to play and was skipped
    PlaybackFailed,

    /// Audio focus was refused
    FocusDenied,

    /// Playback stopped after every item failed
    PlaybackHalted,
}

/// Best-effort message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl PlaybackNotice {
    /// Create a notice
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Position and duration of the current item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl Progress {
    /// Fraction played (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.position_ms as f32 / self.duration_ms as f32).clamp(0.0, 1.0)
    }
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub progress: Progress,
    pub focus_held: bool,
}
