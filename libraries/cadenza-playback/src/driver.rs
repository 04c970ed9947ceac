//! Engine driver - the thread that owns the playback engine
//!
//! All engine access is serialized through two channels: commands from the
//! session/UI side and platform events from the decoder and focus manager.
//! Outcomes are handed to an [`OutcomeSink`] (normally the session).
//!
//! Transport commands carry a request number assigned by the sender. Every
//! outcome is published with the number of the last transport command the
//! engine processed, so the sink can drop outcomes that a newer command has
//! already superseded (e.g. a completion handled just before a queued play).

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cadenza_core::{AudioFocus, MediaBackend, PlatformEvent, PlayableItem};
use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use crate::{
    engine::PlaybackEngine,
    error::{PlaybackError, Result},
    types::{EngineOutcome, EngineSnapshot},
};

/// Commands understood by the engine thread
#[derive(Debug)]
pub enum EngineCommand {
    /// Load the item at `index` and start it once prepared
    Play { index: usize, request: u64 },

    /// Resume `index` if it is loaded, otherwise load it
    Resume { index: usize, request: u64 },

    /// Pause output
    Pause { request: u64 },

    /// Seek to position (in milliseconds)
    Seek { position_ms: u64 },

    /// Tear down the loaded item
    Stop { request: u64 },

    /// Replace the catalog snapshot
    SetCatalog(Arc<[PlayableItem]>),

    /// Reply with a snapshot of the engine
    Query(Sender<EngineSnapshot>),

    /// Release everything and exit the thread
    Shutdown,
}

/// Receiver of engine outcomes
pub trait OutcomeSink: Send + Sync {
    /// Reconcile an outcome into authoritative state
    ///
    /// `request` is the number of the transport command in effect when the
    /// outcome was produced.
    fn apply_outcome(&self, request: u64, outcome: EngineOutcome);
}

/// Sending side of the engine command channel
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: Sender<EngineCommand>,
}

impl EngineHandle {
    /// Wrap a command sender
    pub fn new(tx: Sender<EngineCommand>) -> Self {
        Self { tx }
    }

    /// Send a command to the engine thread
    ///
    /// # Errors
    /// Returns `EngineUnavailable` if the thread has exited.
    pub fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| PlaybackError::EngineUnavailable)
    }

    /// Load and play `index`
    pub fn play(&self, index: usize, request: u64) -> Result<()> {
        self.send(EngineCommand::Play { index, request })
    }

    /// Resume `index`, loading it if needed
    pub fn resume(&self, index: usize, request: u64) -> Result<()> {
        self.send(EngineCommand::Resume { index, request })
    }

    /// Pause output
    pub fn pause(&self, request: u64) -> Result<()> {
        self.send(EngineCommand::Pause { request })
    }

    /// Seek within the loaded item
    pub fn seek(&self, position_ms: u64) -> Result<()> {
        self.send(EngineCommand::Seek { position_ms })
    }

    /// Tear down the loaded item
    pub fn stop(&self, request: u64) -> Result<()> {
        self.send(EngineCommand::Stop { request })
    }

    /// Replace the catalog snapshot
    pub fn set_catalog(&self, catalog: Arc<[PlayableItem]>) -> Result<()> {
        self.send(EngineCommand::SetCatalog(catalog))
    }

    /// Ask the engine thread to exit
    pub fn shutdown(&self) -> Result<()> {
        self.send(EngineCommand::Shutdown)
    }

    /// Query the engine, waiting at most `timeout` for the reply
    ///
    /// Calling this from the engine thread itself (e.g. from an observer
    /// callback triggered by an outcome) always times out.
    ///
    /// # Errors
    /// - `EngineUnavailable` if the thread has exited
    /// - `QueryTimeout` if no reply arrived in time
    pub fn snapshot(&self, timeout: Duration) -> Result<EngineSnapshot> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(EngineCommand::Query(reply_tx))?;

        reply_rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => PlaybackError::QueryTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => PlaybackError::EngineUnavailable,
        })
    }
}

/// Owns the engine and runs its event loop
pub struct EngineDriver<B: MediaBackend, F: AudioFocus> {
    engine: PlaybackEngine<B, F>,
    commands: Receiver<EngineCommand>,
    events: Receiver<PlatformEvent>,
    outcomes: Arc<dyn OutcomeSink>,
    /// Last transport request processed
    request: u64,
}

impl<B, F> EngineDriver<B, F>
where
    B: MediaBackend + 'static,
    F: AudioFocus + 'static,
{
    /// Create a driver
    ///
    /// `events` must be the receiving end of the channel the engine was
    /// created with.
    pub fn new(
        engine: PlaybackEngine<B, F>,
        commands: Receiver<EngineCommand>,
        events: Receiver<PlatformEvent>,
        outcomes: Arc<dyn OutcomeSink>,
    ) -> Self {
        Self {
            engine,
            commands,
            events,
            outcomes,
            request: 0,
        }
    }

    /// Run the loop on a dedicated thread
    ///
    /// # Errors
    /// Returns `ThreadSpawn` if the OS refused to create the thread.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("cadenza-engine".into())
            .spawn(move || self.run())
            .map_err(|e| PlaybackError::ThreadSpawn {
                name: "engine",
                reason: e.to_string(),
            })
    }

    /// Run the loop on the current thread until shutdown
    pub fn run(mut self) {
        info!("Engine thread started");

        loop {
            select! {
                recv(self.commands) -> msg => match msg {
                    Ok(EngineCommand::Shutdown) | Err(_) => break,
                    Ok(command) => self.handle_command(command),
                },
                recv(self.events) -> msg => {
                    if let Ok(event) = msg {
                        let outcomes = self.engine.handle_event(event);
                        self.publish(outcomes);
                    }
                },
            }
        }

        self.engine.shutdown();
        info!("Engine thread stopped");
    }

    fn handle_command(&mut self, command: EngineCommand) {
        debug!("Engine command: {:?}", command);

        let outcomes = match command {
            EngineCommand::Play { index, request } => {
                self.request = request;
                self.engine.play_index(index)
            }
            EngineCommand::Resume { index, request } => {
                self.request = request;
                if self.engine.state().index() == Some(index) {
                    self.engine.resume().unwrap_or_else(|e| {
                        warn!("Resume failed: {}", e);
                        Vec::new()
                    })
                } else {
                    self.engine.play_index(index)
                }
            }
            EngineCommand::Pause { request } => {
                self.request = request;
                match self.engine.pause() {
                    Ok(outcome) => outcome.into_iter().collect(),
                    Err(e) => {
                        debug!("Pause ignored: {}", e);
                        Vec::new()
                    }
                }
            }
            EngineCommand::Seek { position_ms } => {
                if let Err(e) = self.engine.seek(position_ms) {
                    debug!("Seek ignored: {}", e);
                }
                Vec::new()
            }
            EngineCommand::Stop { request } => {
                self.request = request;
                vec![self.engine.stop()]
            }
            EngineCommand::SetCatalog(catalog) => {
                self.engine.set_catalog(catalog).into_iter().collect()
            }
            EngineCommand::Query(reply) => {
                // Caller may have timed out already
                reply.send(self.engine.snapshot()).ok();
                Vec::new()
            }
            EngineCommand::Shutdown => Vec::new(),
        };

        self.publish(outcomes);
    }

    fn publish(&self, outcomes: Vec<EngineOutcome>) {
        for outcome in outcomes {
            self.outcomes.apply_outcome(self.request, outcome);
        }
    }
}
