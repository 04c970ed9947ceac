//! Asynchronous platform events
//!
//! Platform decoders and audio focus managers report lifecycle changes
//! out-of-band. They do so through the sinks defined here, which forward
//! into the single channel consumed by the playback engine's driver.
//!
//! Every decoder sink is stamped with a generation number. The engine hands
//! out a new generation each time it (re)arms a decoder, so callbacks that
//! arrive from a decoder that has since been torn down can be recognised
//! and dropped.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Lifecycle event reported by a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoderEvent {
    /// Asynchronous preparation finished; the decoder can start
    Prepared,

    /// Preparation or playback failed
    Error {
        /// Platform error code
        code: i32,
        /// Platform-specific detail code
        extra: i32,
    },

    /// The track played through to the end
    Completed,
}

/// Audio focus change reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    /// Focus lost for an unbounded time
    Loss,

    /// Focus lost for a short time
    LossTransient,

    /// Focus lost for a short time, output may continue at lower volume
    LossTransientCanDuck,

    /// Focus (re)gained
    Gain,
}

/// Event delivered to the engine driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// Decoder lifecycle event tagged with the sink generation
    Decoder {
        /// Generation of the sink that produced the event
        generation: u64,
        /// The event itself
        event: DecoderEvent,
    },

    /// Audio focus change
    Focus(FocusChange),
}

/// Handle a decoder uses to report lifecycle events
#[derive(Debug, Clone)]
pub struct DecoderEventSink {
    generation: u64,
    tx: Sender<PlatformEvent>,
}

impl DecoderEventSink {
    /// Create a sink for the given generation
    pub fn new(generation: u64, tx: Sender<PlatformEvent>) -> Self {
        Self { generation, tx }
    }

    /// Generation this sink belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report successful preparation
    pub fn prepared(&self) {
        self.emit(DecoderEvent::Prepared);
    }

    /// Report a preparation or runtime error
    pub fn error(&self, code: i32, extra: i32) {
        self.emit(DecoderEvent::Error { code, extra });
    }

    /// Report natural end of track
    pub fn completed(&self) {
        self.emit(DecoderEvent::Completed);
    }

    /// Send an event; a closed receiver means the engine is gone
    pub fn emit(&self, event: DecoderEvent) {
        self.tx
            .send(PlatformEvent::Decoder {
                generation: self.generation,
                event,
            })
            .ok();
    }
}

/// Handle an audio focus manager uses to report focus changes
#[derive(Debug, Clone)]
pub struct FocusEventSink {
    tx: Sender<PlatformEvent>,
}

impl FocusEventSink {
    /// Create a focus sink
    pub fn new(tx: Sender<PlatformEvent>) -> Self {
        Self { tx }
    }

    /// Report a focus change
    pub fn changed(&self, change: FocusChange) {
        self.tx.send(PlatformEvent::Focus(change)).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn decoder_sink_stamps_generation() {
        let (tx, rx) = unbounded();
        let sink = DecoderEventSink::new(3, tx);

        sink.prepared();
        sink.error(1, -1004);
        sink.completed();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                PlatformEvent::Decoder {
                    generation: 3,
                    event: DecoderEvent::Prepared
                },
                PlatformEvent::Decoder {
                    generation: 3,
                    event: DecoderEvent::Error {
                        code: 1,
                        extra: -1004
                    }
                },
                PlatformEvent::Decoder {
                    generation: 3,
                    event: DecoderEvent::Completed
                },
            ]
        );
    }

    #[test]
    fn sinks_tolerate_closed_receiver() {
        let (tx, rx) = unbounded();
        drop(rx);

        // Must not panic
        DecoderEventSink::new(1, tx.clone()).prepared();
        FocusEventSink::new(tx).changed(FocusChange::Loss);
    }
}
