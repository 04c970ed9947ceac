//! Player - wiring and lifetime of the playback subsystem

use std::sync::Arc;
use std::thread::JoinHandle;

use cadenza_core::{AudioFocus, MediaBackend};
use crossbeam_channel::unbounded;
use tracing::{info, warn};

use crate::{
    config::PlayerConfig,
    driver::{EngineDriver, EngineHandle, OutcomeSink},
    engine::PlaybackEngine,
    error::Result,
    poller::{ProgressPoller, ProgressSink},
    session::PlayerSession,
    types::EngineSnapshot,
};

/// Running playback subsystem
///
/// Owns the engine thread and the optional progress poller. The session is
/// shared with UI code through [`Player::session`].
pub struct Player {
    session: Arc<PlayerSession>,
    engine: EngineHandle,
    driver: Option<JoinHandle<()>>,
    poller: Option<ProgressPoller>,
    config: PlayerConfig,
}

impl Player {
    /// Start the playback subsystem
    ///
    /// # Errors
    /// Returns `ThreadSpawn` if the engine thread could not be created.
    pub fn start<B, F>(backend: B, focus: F, config: PlayerConfig) -> Result<Self>
    where
        B: MediaBackend + 'static,
        F: AudioFocus + 'static,
    {
        let config = config.validate();

        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        let engine = EngineHandle::new(command_tx);
        let session = Arc::new(PlayerSession::new(engine.clone()));

        let playback = PlaybackEngine::new(backend, focus, event_tx, config.clone());
        let outcomes: Arc<dyn OutcomeSink> = session.clone();
        let driver = EngineDriver::new(playback, command_rx, event_rx, outcomes).spawn()?;

        info!("Player started");

        Ok(Self {
            session,
            engine,
            driver: Some(driver),
            poller: None,
            config,
        })
    }

    /// Shared session
    pub fn session(&self) -> &Arc<PlayerSession> {
        &self.session
    }

    /// Handle for sending commands straight to the engine thread
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Effective configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Engine state and progress
    ///
    /// # Errors
    /// Returns `EngineUnavailable` or `QueryTimeout` if the engine thread
    /// could not answer.
    pub fn snapshot(&self) -> Result<EngineSnapshot> {
        self.engine.snapshot(self.config.query_timeout())
    }

    /// Position of the current item in milliseconds (0 if unknown)
    pub fn position(&self) -> u64 {
        self.snapshot().map_or(0, |s| s.progress.position_ms)
    }

    /// Duration of the current item in milliseconds (0 if nothing is loaded)
    pub fn duration(&self) -> u64 {
        self.snapshot().map_or(0, |s| s.progress.duration_ms)
    }

    /// Push progress to `sink` every `progress_interval_ms`
    ///
    /// Replaces any previous sink.
    ///
    /// # Errors
    /// Returns `ThreadSpawn` if the poller thread could not be created.
    pub fn start_progress_updates(&mut self, sink: Arc<dyn ProgressSink>) -> Result<()> {
        self.stop_progress_updates();
        self.poller = Some(ProgressPoller::start(
            self.engine.clone(),
            sink,
            self.config.progress_interval(),
            self.config.query_timeout(),
        )?);
        Ok(())
    }

    /// Stop progress updates; safe to call more than once
    pub fn stop_progress_updates(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }

    /// Stop everything and wait for the engine thread to exit
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.stop_progress_updates();

        let Some(driver) = self.driver.take() else {
            return;
        };

        if self.engine.shutdown().is_err() {
            warn!("Engine thread already gone");
        }
        if driver.join().is_err() {
            warn!("Engine thread panicked");
        }
        info!("Player shut down");
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.teardown();
    }
}
