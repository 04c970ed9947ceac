//! Audio arbitration bookkeeping
//!
//! Wraps the platform `AudioFocus` so the engine never requests focus it
//! already holds, never abandons focus it does not hold, and always knows
//! the output gain it should apply.

use cadenza_core::{AudioFocus, FocusEventSink, FocusRequest};
use tracing::debug;

/// Full output gain
const FULL_VOLUME: f32 = 1.0;

/// Tracks whether the audio focus capability is held
pub struct FocusGuard<F: AudioFocus> {
    focus: F,
    listener: FocusEventSink,
    held: bool,
    ducked: bool,
    duck_volume: f32,
}

impl<F: AudioFocus> FocusGuard<F> {
    /// Create a guard; focus changes are reported through `listener`
    pub fn new(focus: F, listener: FocusEventSink, duck_volume: f32) -> Self {
        Self {
            focus,
            listener,
            held: false,
            ducked: false,
            duck_volume,
        }
    }

    /// Acquire focus if not already held
    pub fn acquire(&mut self) -> FocusRequest {
        if self.held {
            return FocusRequest::Granted;
        }

        let result = self.focus.request(self.listener.clone());
        self.held = result == FocusRequest::Granted;
        debug!("Audio focus {:?}", result);
        result
    }

    /// Give focus back if held
    pub fn release(&mut self) {
        if self.held {
            self.focus.abandon();
            self.held = false;
            debug!("Audio focus abandoned");
        }
        self.ducked = false;
    }

    /// Enter ducked output
    pub fn duck(&mut self) {
        self.ducked = true;
    }

    /// Leave ducked output
    pub fn unduck(&mut self) {
        self.ducked = false;
    }

    /// Whether focus is held
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Whether output is ducked
    pub fn is_ducked(&self) -> bool {
        self.ducked
    }

    /// Gain the decoder output should use right now
    pub fn volume(&self) -> f32 {
        if self.ducked {
            self.duck_volume
        } else {
            FULL_VOLUME
        }
    }
}
