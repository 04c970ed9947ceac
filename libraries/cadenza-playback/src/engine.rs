//! Playback engine - decoder lifecycle state machine
//!
//! Owns the single decoder/output resource, gates output on audio focus and
//! turns asynchronous decoder reports into [`EngineOutcome`]s.
//!
//! The engine is synchronous and single-owner. It is driven by
//! [`EngineDriver`](crate::driver::EngineDriver), which feeds it commands and
//! platform events from one thread.

use std::sync::Arc;

use cadenza_core::{
    AudioFocus, Decoder, DecoderEvent, DecoderEventSink, FocusChange, FocusEventSink,
    FocusRequest, MediaBackend, PlatformEvent, PlayableItem,
};
use crossbeam_channel::Sender;
use tracing::{debug, error, info, warn};

use crate::{
    config::PlayerConfig,
    error::{PlaybackError, Result},
    focus::FocusGuard,
    types::{EngineOutcome, EngineSnapshot, EngineState, Progress},
};

/// Decoder lifecycle state machine
pub struct PlaybackEngine<B: MediaBackend, F: AudioFocus> {
    backend: B,
    decoder: Option<B::Decoder>,
    focus: FocusGuard<F>,
    events: Sender<PlatformEvent>,
    catalog: Arc<[PlayableItem]>,
    state: EngineState,
    /// Stamped on every decoder sink; events with an older value are stale
    generation: u64,
    /// Failed items since output last started
    consecutive_failures: usize,
    config: PlayerConfig,
}

impl<B: MediaBackend, F: AudioFocus> PlaybackEngine<B, F> {
    /// Create an engine
    ///
    /// Decoder and focus reports are delivered to `events`; the caller is
    /// responsible for routing them back into [`Self::handle_event`].
    pub fn new(backend: B, focus: F, events: Sender<PlatformEvent>, config: PlayerConfig) -> Self {
        let focus = FocusGuard::new(focus, FocusEventSink::new(events.clone()), config.duck_volume);

        Self {
            backend,
            decoder: None,
            focus,
            events,
            catalog: Arc::from(Vec::new()),
            state: EngineState::Idle,
            generation: 0,
            consecutive_failures: 0,
            config,
        }
    }

    /// Replace the catalog snapshot
    ///
    /// Stops playback if the loaded item no longer exists in the new catalog.
    pub fn set_catalog(&mut self, catalog: Arc<[PlayableItem]>) -> Option<EngineOutcome> {
        self.catalog = catalog;

        match self.state.index() {
            Some(index) if index >= self.catalog.len() => {
                warn!(index, len = self.catalog.len(), "Loaded item left the catalog, stopping");
                Some(self.stop())
            }
            _ => None,
        }
    }

    /// Current catalog snapshot
    pub fn catalog(&self) -> &Arc<[PlayableItem]> {
        &self.catalog
    }

    /// Current state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Current decoder generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether audio focus is held
    pub fn has_focus(&self) -> bool {
        self.focus.is_held()
    }

    /// Start preparing the item at `index`
    ///
    /// Output starts automatically once the decoder reports `Prepared` and
    /// audio focus is granted.
    ///
    /// # Errors
    /// - `CatalogEmpty` / `InvalidIndex` for a bad index
    /// - `ResourceUnavailable` if the content cannot be opened; the engine
    ///   state is left untouched
    /// - `Backend` if the decoder could not be created or rejected the data
    ///   source; the engine is left in `Error`
    pub fn load(&mut self, index: usize) -> Result<()> {
        let item = self.item(index)?.clone();

        if item.locator.is_blank() || !self.backend.is_accessible(&item.locator) {
            return Err(PlaybackError::ResourceUnavailable(item.locator));
        }

        self.teardown();

        if self.decoder.is_none() {
            match self.backend.create_decoder() {
                Ok(decoder) => self.decoder = Some(decoder),
                Err(e) => {
                    self.state = EngineState::Error;
                    return Err(e.into());
                }
            }
        }

        self.generation += 1;
        let sink = DecoderEventSink::new(self.generation, self.events.clone());

        let prepared = match self.decoder.as_mut() {
            Some(decoder) => {
                decoder.set_event_sink(sink);
                decoder.prepare_async(&item.locator)
            }
            None => return Err(PlaybackError::NoDecoderLoaded),
        };

        if let Err(e) = prepared {
            warn!("Decoder rejected {}: {}", item.locator, e);
            self.destroy_decoder();
            self.state = EngineState::Error;
            return Err(e.into());
        }

        info!(index, title = %item.title, "Preparing item");
        self.state = EngineState::Preparing(index);
        Ok(())
    }

    /// Load `index`, skipping forward past items that cannot be loaded
    ///
    /// Reports `Failed` for each skipped item, `Advanced` if the engine
    /// settled on a different item, and `Halted` if the failure cap was hit.
    pub fn load_or_skip(&mut self, index: usize) -> Vec<EngineOutcome> {
        let (landed, mut outcomes) = self.try_load_from(index);
        if let Some(landed) = landed {
            if landed != index {
                outcomes.push(EngineOutcome::Advanced { index: landed });
            }
        }
        outcomes
    }

    /// Explicit request to play `index` (a fresh failure budget)
    pub fn play_index(&mut self, index: usize) -> Vec<EngineOutcome> {
        self.consecutive_failures = 0;
        self.load_or_skip(index)
    }

    /// Start output of a prepared item
    ///
    /// # Errors
    /// Returns `InvalidState` unless an item is prepared.
    pub fn start(&mut self) -> Result<Vec<EngineOutcome>> {
        match self.state {
            EngineState::Ready(index) => Ok(self.start_output(index)),
            EngineState::Playing(_) => Ok(Vec::new()),
            state => Err(PlaybackError::InvalidState {
                operation: "start",
                state,
            }),
        }
    }

    /// Resume paused (or prepared) output
    ///
    /// Re-requests audio focus if it is not held. While preparing this is a
    /// no-op since output starts on its own.
    ///
    /// # Errors
    /// Returns `NoDecoderLoaded` from `Idle` or `Error`.
    pub fn resume(&mut self) -> Result<Vec<EngineOutcome>> {
        match self.state {
            EngineState::Ready(index) | EngineState::Paused(index) => Ok(self.start_output(index)),
            EngineState::Playing(_) | EngineState::Preparing(_) => Ok(Vec::new()),
            EngineState::Idle | EngineState::Error => Err(PlaybackError::NoDecoderLoaded),
        }
    }

    /// Pause output
    ///
    /// # Errors
    /// Returns `InvalidState` unless a decoder is loaded.
    pub fn pause(&mut self) -> Result<Option<EngineOutcome>> {
        match self.state {
            EngineState::Playing(index) => {
                if let Some(decoder) = self.decoder.as_mut() {
                    if decoder.is_playing() {
                        decoder.pause()?;
                    }
                }
                self.state = EngineState::Paused(index);
                self.focus.release();
                debug!(index, "Paused");
                Ok(Some(EngineOutcome::Paused { index }))
            }
            EngineState::Paused(_) | EngineState::Ready(_) => Ok(None),
            state => Err(PlaybackError::InvalidState {
                operation: "pause",
                state,
            }),
        }
    }

    /// Seek within the loaded item, clamped to `[0, duration]`
    ///
    /// Returns the position actually used.
    ///
    /// # Errors
    /// Returns `InvalidState` unless a decoder is loaded.
    pub fn seek(&mut self, position_ms: u64) -> Result<u64> {
        if !self.state.is_loaded() {
            return Err(PlaybackError::InvalidState {
                operation: "seek",
                state: self.state,
            });
        }

        let target = position_ms.min(self.duration());
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.seek_to(target)?;
        }
        debug!(target, "Seeked");
        Ok(target)
    }

    /// Tear down the loaded item and return to `Idle`
    pub fn stop(&mut self) -> EngineOutcome {
        self.teardown();
        self.state = EngineState::Idle;
        EngineOutcome::Stopped
    }

    /// Release every platform resource
    pub fn shutdown(&mut self) {
        self.teardown();
        if let Some(mut decoder) = self.decoder.take() {
            decoder.release();
        }
        self.state = EngineState::Idle;
        info!("Playback engine shut down");
    }

    /// Duration of the loaded item in milliseconds
    ///
    /// Prefers the decoder's report, then the item metadata, then the
    /// configured fallback. Returns 0 when nothing is loaded.
    pub fn duration(&self) -> u64 {
        let Some(item) = self.state.index().and_then(|i| self.catalog.get(i)) else {
            return 0;
        };

        let reported = if self.state.is_loaded() {
            self.decoder.as_ref().and_then(Decoder::duration)
        } else {
            None
        };

        match reported {
            Some(ms) if ms > 0 => ms.unsigned_abs(),
            _ => item
                .known_duration_ms()
                .unwrap_or(self.config.fallback_duration_ms),
        }
    }

    /// Current position in milliseconds, or 0 when nothing is loaded
    pub fn position(&self) -> u64 {
        if !self.state.is_loaded() {
            return 0;
        }
        self.decoder
            .as_ref()
            .map_or(0, Decoder::current_position)
    }

    /// State plus progress
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            progress: Progress {
                position_ms: self.position(),
                duration_ms: self.duration(),
            },
            focus_held: self.focus.is_held(),
        }
    }

    /// Process a platform event
    pub fn handle_event(&mut self, event: PlatformEvent) -> Vec<EngineOutcome> {
        match event {
            PlatformEvent::Decoder { generation, event } => {
                if generation != self.generation {
                    debug!(
                        generation,
                        current = self.generation,
                        "Dropping {:?} from stale decoder",
                        event
                    );
                    return Vec::new();
                }
                self.handle_decoder_event(event)
            }
            PlatformEvent::Focus(change) => self.handle_focus_change(change).into_iter().collect(),
        }
    }

    fn handle_decoder_event(&mut self, event: DecoderEvent) -> Vec<EngineOutcome> {
        match (event, self.state) {
            (DecoderEvent::Prepared, EngineState::Preparing(index)) => {
                self.state = EngineState::Ready(index);
                debug!(index, "Prepared");
                self.start_output(index)
            }
            (DecoderEvent::Error { code, extra }, state) => {
                let Some(index) = state.index() else {
                    debug!(code, extra, "Decoder error with nothing loaded");
                    return Vec::new();
                };
                let error = if matches!(state, EngineState::Preparing(_)) {
                    PlaybackError::PrepareFailure { index, code }
                } else {
                    PlaybackError::DecoderRuntimeError { code }
                };
                warn!(index, code, extra, "Decoder error");
                self.recover_from_failure(index, error)
            }
            (DecoderEvent::Completed, EngineState::Playing(index) | EngineState::Paused(index)) => {
                info!(index, "Item completed");
                self.teardown();
                self.state = EngineState::Idle;
                let next = (index + 1) % self.catalog.len().max(1);
                self.advance_to(next)
            }
            (event, state) => {
                debug!("Ignoring {:?} in {:?}", event, state);
                Vec::new()
            }
        }
    }

    fn handle_focus_change(&mut self, change: FocusChange) -> Option<EngineOutcome> {
        debug!("Audio focus change: {:?}", change);

        match change {
            FocusChange::Loss | FocusChange::LossTransient => match self.pause() {
                Ok(outcome) => outcome,
                Err(e) => {
                    debug!("Nothing to pause on focus loss: {}", e);
                    None
                }
            },
            FocusChange::LossTransientCanDuck => {
                self.focus.duck();
                self.apply_volume();
                None
            }
            FocusChange::Gain => {
                if self.focus.is_ducked() {
                    self.focus.unduck();
                    self.apply_volume();
                }
                None
            }
        }
    }

    /// Request focus and start the decoder
    fn start_output(&mut self, index: usize) -> Vec<EngineOutcome> {
        if self.focus.acquire() == FocusRequest::Denied {
            warn!(index, "Audio focus denied, staying paused");
            return vec![EngineOutcome::Degraded {
                index,
                error: PlaybackError::ArbitrationDenied,
            }];
        }

        self.apply_volume();
        let started = match self.decoder.as_mut() {
            Some(decoder) => decoder.start().map_err(PlaybackError::from),
            None => Err(PlaybackError::NoDecoderLoaded),
        };

        match started {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.state = EngineState::Playing(index);
                info!(index, "Playback started");
                vec![EngineOutcome::Started { index }]
            }
            Err(e) => {
                warn!(index, "Decoder failed to start: {}", e);
                self.recover_from_failure(index, e)
            }
        }
    }

    /// Replace the failed decoder and move on to the next item
    fn recover_from_failure(&mut self, index: usize, error: PlaybackError) -> Vec<EngineOutcome> {
        self.destroy_decoder();
        self.state = EngineState::Error;

        match self.backend.create_decoder() {
            Ok(decoder) => self.decoder = Some(decoder),
            Err(e) => error!("Failed to create replacement decoder: {}", e),
        }

        self.consecutive_failures += 1;
        let mut outcomes = vec![EngineOutcome::Failed { index, error }];

        if self.consecutive_failures >= self.failure_cap() {
            outcomes.push(self.halt());
            return outcomes;
        }

        let next = (index + 1) % self.catalog.len().max(1);
        outcomes.extend(self.advance_to(next));
        outcomes
    }

    /// Load `next` on the engine's own initiative
    fn advance_to(&mut self, next: usize) -> Vec<EngineOutcome> {
        let (landed, mut outcomes) = self.try_load_from(next);
        if let Some(index) = landed {
            outcomes.push(EngineOutcome::Advanced { index });
        }
        outcomes
    }

    /// Walk forward from `index` until an item starts preparing
    fn try_load_from(&mut self, index: usize) -> (Option<usize>, Vec<EngineOutcome>) {
        let mut outcomes = Vec::new();
        let mut candidate = index;

        loop {
            match self.load(candidate) {
                Ok(()) => return (Some(candidate), outcomes),
                Err(e) if e.is_validation() => {
                    warn!(index = candidate, "Cannot load: {}", e);
                    return (None, outcomes);
                }
                Err(e) => {
                    warn!(index = candidate, "Skipping item: {}", e);
                    self.consecutive_failures += 1;
                    outcomes.push(EngineOutcome::Failed {
                        index: candidate,
                        error: e,
                    });

                    if self.consecutive_failures >= self.failure_cap() {
                        outcomes.push(self.halt());
                        return (None, outcomes);
                    }
                    candidate = (candidate + 1) % self.catalog.len();
                }
            }
        }
    }

    fn halt(&mut self) -> EngineOutcome {
        let attempts = self.consecutive_failures;
        error!(attempts, "Every item failed to play, halting");
        self.teardown();
        self.state = EngineState::Error;
        self.consecutive_failures = 0;
        EngineOutcome::Halted { attempts }
    }

    fn failure_cap(&self) -> usize {
        self.config.failure_cap(self.catalog.len())
    }

    fn item(&self, index: usize) -> Result<&PlayableItem> {
        if self.catalog.is_empty() {
            return Err(PlaybackError::CatalogEmpty);
        }
        self.catalog.get(index).ok_or(PlaybackError::InvalidIndex {
            index,
            len: self.catalog.len(),
        })
    }

    fn apply_volume(&mut self) {
        let volume = self.focus.volume();
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.set_volume(volume);
        }
    }

    /// Stop and reset the decoder, keeping it for reuse
    fn teardown(&mut self) {
        let state = self.state;
        if let Some(decoder) = self.decoder.as_mut() {
            if state.is_loaded() {
                if let Err(e) = decoder.stop() {
                    debug!("Ignoring stop error during teardown: {}", e);
                }
            }
            if state != EngineState::Idle {
                if let Err(e) = decoder.reset() {
                    debug!("Ignoring reset error during teardown: {}", e);
                }
            }
        }
        // Invalidate callbacks still in flight from the old item
        self.generation += 1;
        self.focus.release();
    }

    /// Stop, reset and release the decoder
    fn destroy_decoder(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            if let Err(e) = decoder.stop() {
                debug!("Ignoring stop error on failed decoder: {}", e);
            }
            if let Err(e) = decoder.reset() {
                debug!("Ignoring reset error on failed decoder: {}", e);
            }
            decoder.release();
        }
        self.generation += 1;
        self.focus.release();
    }
}
