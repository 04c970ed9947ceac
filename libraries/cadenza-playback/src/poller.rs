//! Periodic position/duration updates for a UI surface

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::{debug, warn};

use crate::{
    driver::EngineHandle,
    error::{PlaybackError, Result},
    types::Progress,
};

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    /// Called once per poll interval while an answer is available
    fn on_progress(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn on_progress(&self, progress: Progress) {
        self(progress);
    }
}

/// Cancellable background task that republishes engine progress
///
/// Queries go to the engine thread with a timeout; the session lock is
/// never taken, so a stalled observer cannot block the poller and the
/// poller cannot block a command.
pub struct ProgressPoller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressPoller {
    /// Start polling every `interval`
    ///
    /// # Errors
    /// Returns `ThreadSpawn` if the thread could not be created.
    pub fn start(
        engine: EngineHandle,
        sink: Arc<dyn ProgressSink>,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("cadenza-progress".into())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => match engine.snapshot(timeout) {
                            Ok(snapshot) => sink.on_progress(snapshot.progress),
                            Err(PlaybackError::EngineUnavailable) => {
                                debug!("Engine gone, progress updates stopped");
                                break;
                            }
                            Err(e) => debug!("Skipping progress tick: {}", e),
                        },
                    }
                }
            })
            .map_err(|e| PlaybackError::ThreadSpawn {
                name: "progress",
                reason: e.to_string(),
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Whether the poller thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling; safe to call more than once
    pub fn stop(&mut self) {
        // Dropping the sender wakes the thread
        self.stop_tx.take();

        if let Some(handle) = self.handle.take() {
            // Stopped from inside a progress callback
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("Progress thread panicked");
            }
        }
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
