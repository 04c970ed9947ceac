//! Common test utilities: scripted platform collaborators and a recording observer
#![allow(dead_code)]

use cadenza_core::{
    AudioFocus, ContentLocator, CoreError, Decoder, DecoderEventSink, FocusChange, FocusEventSink,
    FocusRequest, ItemId, MediaBackend, PlayableItem,
};
use cadenza_playback::{NoticeKind, PlaybackNotice, PlayerObserver};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Install a test subscriber once; `RUST_LOG=debug` shows engine traces
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();
}

pub fn item(id: i64, duration_ms: u64, locator: &str) -> PlayableItem {
    PlayableItem::new(
        ItemId::new(id),
        format!("Song {}", id),
        "Test Artist",
        "Test Album",
        duration_ms,
        ContentLocator::new(locator),
    )
}

/// `n` accessible items with ids 1..=n and locators `file:///<id>.mp3`
pub fn items(n: i64) -> Vec<PlayableItem> {
    (1..=n)
        .map(|id| item(id, 180_000, &format!("file:///{}.mp3", id)))
        .collect()
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// ============================================================================
// MEDIA BACKEND
// ============================================================================

/// How the scripted decoder reacts to a locator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    /// Reports `Prepared` right away
    Prepares,
    /// Reports `Error { code }` instead of `Prepared`
    FailsPrepare(i32),
    /// Reports `Prepared`, but `start` returns an error
    FailsStart,
    /// `prepare_async` rejects the data source
    Rejected,
    /// `is_accessible` returns false
    Inaccessible,
    /// Never reports anything
    Silent,
}

#[derive(Default)]
struct BackendState {
    behaviors: HashMap<String, Behavior>,
    durations: HashMap<String, i64>,
    calls: Vec<String>,
    sink: Option<DecoderEventSink>,
    loaded: Option<String>,
    position_ms: u64,
    duration_ms: Option<i64>,
    volume: f32,
    playing: bool,
}

/// Media backend whose decoders follow a per-locator script
///
/// Clones share state, so a test can keep one clone to inspect calls and
/// fire decoder events while the engine owns the other.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<BackendState>>,
    created: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(self, locator: &str, behavior: Behavior) -> Self {
        self.state
            .lock()
            .behaviors
            .insert(locator.to_string(), behavior);
        self
    }

    /// Duration the decoder reports once `locator` is prepared
    pub fn with_decoder_duration(self, locator: &str, duration_ms: i64) -> Self {
        self.state
            .lock()
            .durations
            .insert(locator.to_string(), duration_ms);
        self
    }

    /// Every decoder call so far, e.g. `"prepare file:///1.mp3"`, `"start"`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Locators passed to `prepare_async`, in order
    pub fn prepared_locators(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("prepare ").map(str::to_string))
            .collect()
    }

    pub fn decoders_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn set_position(&self, position_ms: u64) {
        self.state.lock().position_ms = position_ms;
    }

    /// The sink installed by the most recent prepare
    pub fn current_sink(&self) -> Option<DecoderEventSink> {
        self.state.lock().sink.clone()
    }

    /// Report natural end of the current item
    pub fn complete_current(&self) {
        if let Some(sink) = self.current_sink() {
            sink.completed();
        }
    }

    /// Report a runtime error on the current item
    pub fn fail_current(&self, code: i32) {
        if let Some(sink) = self.current_sink() {
            sink.error(code, 0);
        }
    }

    /// Report `Prepared` for the current item (for `Silent` locators)
    pub fn prepare_current(&self) {
        if let Some(sink) = self.current_sink() {
            sink.prepared();
        }
    }

    fn behavior(&self, locator: &ContentLocator) -> Behavior {
        self.state
            .lock()
            .behaviors
            .get(locator.as_str())
            .copied()
            .unwrap_or(Behavior::Prepares)
    }
}

impl MediaBackend for ScriptedBackend {
    type Decoder = ScriptedDecoder;

    fn create_decoder(&mut self) -> cadenza_core::Result<ScriptedDecoder> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.state.lock().calls.push("create".to_string());
        Ok(ScriptedDecoder {
            backend: self.clone(),
        })
    }

    fn is_accessible(&self, locator: &ContentLocator) -> bool {
        self.behavior(locator) != Behavior::Inaccessible
    }
}

pub struct ScriptedDecoder {
    backend: ScriptedBackend,
}

impl ScriptedDecoder {
    fn record(&self, call: impl Into<String>) {
        self.backend.state.lock().calls.push(call.into());
    }
}

impl Decoder for ScriptedDecoder {
    fn set_event_sink(&mut self, sink: DecoderEventSink) {
        self.backend.state.lock().sink = Some(sink);
    }

    fn prepare_async(&mut self, locator: &ContentLocator) -> cadenza_core::Result<()> {
        self.record(format!("prepare {}", locator));
        let behavior = self.backend.behavior(locator);

        if behavior == Behavior::Rejected {
            return Err(CoreError::inaccessible(locator.as_str()));
        }

        let sink = {
            let mut state = self.backend.state.lock();
            state.duration_ms = state.durations.get(locator.as_str()).copied();
            state.position_ms = 0;
            state.loaded = Some(locator.as_str().to_string());
            state.sink.clone()
        };

        if let Some(sink) = sink {
            match behavior {
                Behavior::Prepares | Behavior::FailsStart => sink.prepared(),
                Behavior::FailsPrepare(code) => sink.error(code, 0),
                Behavior::Rejected | Behavior::Inaccessible | Behavior::Silent => {}
            }
        }
        Ok(())
    }

    fn start(&mut self) -> cadenza_core::Result<()> {
        self.record("start");
        let loaded = self.backend.state.lock().loaded.clone();
        if let Some(locator) = loaded.map(ContentLocator::new) {
            if self.backend.behavior(&locator) == Behavior::FailsStart {
                return Err(CoreError::decoder(format!("cannot start {}", locator)));
            }
        }
        self.backend.state.lock().playing = true;
        Ok(())
    }

    fn pause(&mut self) -> cadenza_core::Result<()> {
        self.record("pause");
        self.backend.state.lock().playing = false;
        Ok(())
    }

    fn stop(&mut self) -> cadenza_core::Result<()> {
        self.record("stop");
        self.backend.state.lock().playing = false;
        Ok(())
    }

    fn reset(&mut self) -> cadenza_core::Result<()> {
        self.record("reset");
        let mut state = self.backend.state.lock();
        state.duration_ms = None;
        state.position_ms = 0;
        state.loaded = None;
        Ok(())
    }

    fn release(&mut self) {
        self.record("release");
    }

    fn seek_to(&mut self, position_ms: u64) -> cadenza_core::Result<()> {
        self.record(format!("seek {}", position_ms));
        self.backend.state.lock().position_ms = position_ms;
        Ok(())
    }

    fn current_position(&self) -> u64 {
        self.backend.state.lock().position_ms
    }

    fn duration(&self) -> Option<i64> {
        self.backend.state.lock().duration_ms
    }

    fn is_playing(&self) -> bool {
        self.backend.state.lock().playing
    }

    fn set_volume(&mut self, gain: f32) {
        self.backend.state.lock().volume = gain;
    }
}

// ============================================================================
// AUDIO FOCUS
// ============================================================================

/// Audio focus that grants or denies on demand and can fire focus changes
#[derive(Clone)]
pub struct ScriptedFocus {
    grant: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    abandons: Arc<AtomicUsize>,
    listener: Arc<Mutex<Option<FocusEventSink>>>,
}

impl ScriptedFocus {
    pub fn granting() -> Self {
        Self::new(true)
    }

    pub fn denying() -> Self {
        Self::new(false)
    }

    fn new(grant: bool) -> Self {
        Self {
            grant: Arc::new(AtomicBool::new(grant)),
            requests: Arc::new(AtomicUsize::new(0)),
            abandons: Arc::new(AtomicUsize::new(0)),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_grant(&self, grant: bool) {
        self.grant.store(grant, Ordering::SeqCst);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn abandons(&self) -> usize {
        self.abandons.load(Ordering::SeqCst)
    }

    /// Deliver a focus change as the platform would
    pub fn emit(&self, change: FocusChange) {
        if let Some(listener) = self.listener.lock().as_ref() {
            listener.changed(change);
        }
    }
}

impl AudioFocus for ScriptedFocus {
    fn request(&mut self, listener: FocusEventSink) -> FocusRequest {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.listener.lock() = Some(listener);
        if self.grant.load(Ordering::SeqCst) {
            FocusRequest::Granted
        } else {
            FocusRequest::Denied
        }
    }

    fn abandon(&mut self) {
        self.abandons.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// OBSERVER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Song { index: usize, id: i64 },
    State(bool),
    Notice(NoticeKind),
}

/// Observer that records every callback
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn songs(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Song { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::State(playing) => Some(playing),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<NoticeKind> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Notice(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    pub fn last_state(&self) -> Option<bool> {
        self.states().last().copied()
    }
}

impl PlayerObserver for RecordingObserver {
    fn on_song_selected(&self, item: &PlayableItem, index: usize) {
        self.events.lock().push(Recorded::Song {
            index,
            id: item.id.get(),
        });
    }

    fn on_playback_state_changed(&self, playing: bool) {
        self.events.lock().push(Recorded::State(playing));
    }

    fn on_notice(&self, notice: &PlaybackNotice) {
        self.events.lock().push(Recorded::Notice(notice.kind));
    }
}
