//! Player session - the authoritative "what is playing" state
//!
//! The session owns the catalog snapshot, the current index, the playing
//! flag and the observer registry. UI commands come in through its methods,
//! engine outcomes through [`OutcomeSink::apply_outcome`]; both paths update
//! state and fan out to observers under one reentrant command gate, so a
//! command and a reconciliation never interleave while an observer callback
//! can still call back into the session.
//!
//! Every transport command sent to the engine is numbered. Outcomes produced
//! under an older number than the last one sent describe an intent the user
//! has already replaced and are dropped.
//!
//! Validation failures never reach the caller: they are logged and ignored.

use std::sync::Arc;

use cadenza_core::{Catalog, PlayableItem};
use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    driver::{EngineHandle, OutcomeSink},
    error::{PlaybackError, Result},
    observer::{ObserverRegistry, PlayerObserver},
    suggest,
    types::{EngineOutcome, NoticeKind, PlaybackNotice},
};

struct SessionState {
    catalog: Arc<[PlayableItem]>,
    current: Option<usize>,
    playing: bool,
    /// Number of the last transport command sent
    request: u64,
}

/// Authoritative playback session
pub struct PlayerSession {
    gate: ReentrantMutex<()>,
    state: RwLock<SessionState>,
    observers: ObserverRegistry,
    engine: Option<EngineHandle>,
}

impl PlayerSession {
    /// Create a session that drives the given engine
    pub fn new(engine: EngineHandle) -> Self {
        Self::with_engine(Some(engine))
    }

    /// Create a session without an engine
    ///
    /// Commands update state and notify observers but nothing is played.
    pub fn detached() -> Self {
        Self::with_engine(None)
    }

    fn with_engine(engine: Option<EngineHandle>) -> Self {
        Self {
            gate: ReentrantMutex::new(()),
            state: RwLock::new(SessionState {
                catalog: Arc::from(Vec::new()),
                current: None,
                playing: false,
                request: 0,
            }),
            observers: ObserverRegistry::new(),
            engine,
        }
    }

    // ===== Catalog =====

    /// Replace the catalog
    ///
    /// Keeps the current index and playing flag and does not notify
    /// observers. A selection that no longer fits the new catalog is cleared.
    pub fn set_catalog(&self, items: impl Into<Arc<[PlayableItem]>>) {
        let _gate = self.gate.lock();
        let catalog: Arc<[PlayableItem]> = items.into();

        {
            let mut state = self.state.write();
            if let Some(index) = state.current {
                if index >= catalog.len() {
                    warn!(
                        index,
                        len = catalog.len(),
                        "Selection does not fit new catalog, clearing it"
                    );
                    state.current = None;
                }
            }
            state.catalog = Arc::clone(&catalog);
        }

        info!("Catalog set ({} items)", catalog.len());
        self.send(|engine| engine.set_catalog(catalog));
    }

    /// Pull the catalog from a collaborator
    pub fn refresh_catalog(&self, source: &dyn Catalog) {
        self.set_catalog(source.all_items());
    }

    // ===== Selection =====

    /// Select the item at `index` and play it
    ///
    /// Re-selecting the current item only re-asserts the playing state (and
    /// resumes the engine); it never reloads.
    pub fn select_song(&self, index: usize) {
        let _gate = self.gate.lock();

        let item = match self.validate(index) {
            Ok(item) => item,
            Err(e) => {
                warn!("Ignoring select_song: {}", e);
                return;
            }
        };

        let (unchanged, request) = {
            let mut state = self.state.write();
            let unchanged = state.current == Some(index);
            state.current = Some(index);
            state.playing = true;
            state.request += 1;
            (unchanged, state.request)
        };

        if unchanged {
            debug!(index, "Re-selected current item");
            self.notify_playback_state(true);
            self.send(|engine| engine.resume(index, request));
        } else {
            info!(index, title = %item.title, "Song selected");
            self.notify_song_selected(&item, index);
            self.notify_playback_state(true);
            self.send(|engine| engine.play(index, request));
        }
    }

    /// Select the item at `index` and restart it, even if already current
    pub fn force_select_song(&self, index: usize) {
        let _gate = self.gate.lock();

        let item = match self.validate(index) {
            Ok(item) => item,
            Err(e) => {
                warn!("Ignoring force_select_song: {}", e);
                return;
            }
        };

        let request = {
            let mut state = self.state.write();
            state.current = Some(index);
            state.playing = true;
            state.request += 1;
            state.request
        };

        info!(index, title = %item.title, "Song force-selected");
        self.notify_song_selected(&item, index);
        self.notify_playback_state(true);
        self.send(|engine| engine.play(index, request));
    }

    /// Set the playing flag and notify observers
    pub fn set_playback_state(&self, playing: bool) {
        let _gate = self.gate.lock();
        self.state.write().playing = playing;
        self.notify_playback_state(playing);
    }

    // ===== Transport =====

    /// Play the next item, wrapping to the start
    pub fn play_next(&self) {
        let _gate = self.gate.lock();
        let (len, current) = self.position();
        if len == 0 {
            warn!("Ignoring play_next: catalog is empty");
            return;
        }
        let next = current.map_or(0, |i| (i + 1) % len);
        self.force_select_song(next);
    }

    /// Play the previous item, wrapping to the end
    pub fn play_previous(&self) {
        let _gate = self.gate.lock();
        let (len, current) = self.position();
        if len == 0 {
            warn!("Ignoring play_previous: catalog is empty");
            return;
        }
        let previous = match current {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.force_select_song(previous);
    }

    /// Pause playback
    pub fn pause(&self) {
        let _gate = self.gate.lock();
        let request = self.next_request();
        self.update_playing(false);
        self.send(|engine| engine.pause(request));
    }

    /// Resume the current item, loading it if the engine has nothing loaded
    pub fn resume(&self) {
        let _gate = self.gate.lock();
        let Some(index) = self.current_index() else {
            warn!("Ignoring resume: no song selected");
            return;
        };
        let request = self.next_request();
        self.update_playing(true);
        self.send(|engine| engine.resume(index, request));
    }

    /// Pause if playing, resume otherwise
    pub fn toggle_playback(&self) {
        let _gate = self.gate.lock();
        if self.is_playing() {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Seek within the current item (milliseconds)
    pub fn seek(&self, position_ms: u64) {
        let _gate = self.gate.lock();
        self.send(|engine| engine.seek(position_ms));
    }

    /// Stop playback and release the decoder
    pub fn stop(&self) {
        let _gate = self.gate.lock();
        let request = self.next_request();
        self.update_playing(false);
        self.send(|engine| engine.stop(request));
    }

    // ===== Queries =====

    /// Current index
    pub fn current_index(&self) -> Option<usize> {
        self.state.read().current
    }

    /// Current item
    pub fn current_song(&self) -> Option<PlayableItem> {
        let state = self.state.read();
        state.current.and_then(|i| state.catalog.get(i).cloned())
    }

    /// Whether audio is (meant to be) playing
    pub fn is_playing(&self) -> bool {
        self.state.read().playing
    }

    /// Current catalog snapshot
    pub fn catalog(&self) -> Arc<[PlayableItem]> {
        Arc::clone(&self.state.read().catalog)
    }

    /// Number of the last transport command sent to the engine
    pub fn last_request(&self) -> u64 {
        self.state.read().request
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Up to `count` random items, optionally excluding the current one
    pub fn random_suggestions(&self, count: usize, exclude_current: bool) -> Vec<PlayableItem> {
        let (catalog, current) = {
            let state = self.state.read();
            (Arc::clone(&state.catalog), state.current)
        };
        let exclude = if exclude_current { current } else { None };
        suggest::random_suggestions(&catalog, exclude, count)
    }

    // ===== Observers =====

    /// Register an observer
    ///
    /// If a song is selected, the new observer immediately receives the
    /// current song and playing state. Registering twice has no effect.
    pub fn register_observer(&self, observer: Arc<dyn PlayerObserver>) {
        let _gate = self.gate.lock();

        if !self.observers.register(Arc::clone(&observer)) {
            debug!("Observer already registered");
            return;
        }

        let catch_up = {
            let state = self.state.read();
            state.current.and_then(|i| {
                state
                    .catalog
                    .get(i)
                    .cloned()
                    .map(|item| (item, i, state.playing))
            })
        };

        if let Some((item, index, playing)) = catch_up {
            observer.on_song_selected(&item, index);
            observer.on_playback_state_changed(playing);
        }
    }

    /// Unregister an observer; unknown observers are ignored
    pub fn unregister_observer(&self, observer: &Arc<dyn PlayerObserver>) {
        if !self.observers.unregister(observer) {
            debug!("Observer was not registered");
        }
    }

    // ===== Helpers =====

    fn validate(&self, index: usize) -> Result<PlayableItem> {
        let state = self.state.read();
        if state.catalog.is_empty() {
            return Err(PlaybackError::CatalogEmpty);
        }
        state
            .catalog
            .get(index)
            .cloned()
            .ok_or(PlaybackError::InvalidIndex {
                index,
                len: state.catalog.len(),
            })
    }

    fn next_request(&self) -> u64 {
        let mut state = self.state.write();
        state.request += 1;
        state.request
    }

    fn position(&self) -> (usize, Option<usize>) {
        let state = self.state.read();
        (state.catalog.len(), state.current)
    }

    /// Set the playing flag, notifying only on change
    fn update_playing(&self, playing: bool) {
        let changed = {
            let mut state = self.state.write();
            let changed = state.playing != playing;
            state.playing = playing;
            changed
        };
        if changed {
            self.notify_playback_state(playing);
        }
    }

    fn send(&self, command: impl FnOnce(&EngineHandle) -> Result<()>) {
        if let Some(engine) = &self.engine {
            if let Err(e) = command(engine) {
                warn!("Engine command not delivered: {}", e);
            }
        }
    }

    fn notify_song_selected(&self, item: &PlayableItem, index: usize) {
        self.observers.notify(|o| o.on_song_selected(item, index));
    }

    fn notify_playback_state(&self, playing: bool) {
        self.observers.notify(|o| o.on_playback_state_changed(playing));
    }

    fn notify_notice(&self, notice: &PlaybackNotice) {
        self.observers.notify(|o| o.on_notice(notice));
    }
}

impl OutcomeSink for PlayerSession {
    fn apply_outcome(&self, request: u64, outcome: EngineOutcome) {
        let _gate = self.gate.lock();

        let latest = self.last_request();
        if request < latest {
            debug!(request, latest, "Dropping superseded outcome {:?}", outcome);
            return;
        }
        debug!("Engine outcome: {:?}", outcome);

        match outcome {
            EngineOutcome::Started { index } => {
                if self.current_index() != Some(index) {
                    self.move_to(index);
                }
                self.update_playing(true);
            }
            EngineOutcome::Paused { .. } | EngineOutcome::Stopped => self.update_playing(false),
            EngineOutcome::Advanced { index } => self.move_to(index),
            EngineOutcome::Failed { index, error } => {
                self.update_playing(false);
                let title = self
                    .catalog()
                    .get(index)
                    .map_or_else(|| format!("item {}", index), |item| item.title.clone());
                self.notify_notice(&PlaybackNotice::new(
                    NoticeKind::PlaybackFailed,
                    format!("Could not play \"{}\": {}", title, error),
                ));
            }
            EngineOutcome::Degraded { error, .. } => {
                self.update_playing(false);
                self.notify_notice(&PlaybackNotice::new(
                    NoticeKind::FocusDenied,
                    format!("Playback paused: {}", error),
                ));
            }
            EngineOutcome::Halted { attempts } => {
                self.update_playing(false);
                self.notify_notice(&PlaybackNotice::new(
                    NoticeKind::PlaybackHalted,
                    format!("Playback stopped after {} items failed", attempts),
                ));
            }
        }
    }
}

impl PlayerSession {
    /// Engine moved on by itself: follow it and announce the new item
    fn move_to(&self, index: usize) {
        let item = {
            let mut state = self.state.write();
            let Some(item) = state.catalog.get(index).cloned() else {
                warn!(index, "Engine reported an index outside the catalog");
                return;
            };
            state.current = Some(index);
            item
        };
        info!(index, title = %item.title, "Advanced");
        self.notify_song_selected(&item, index);
    }
}
