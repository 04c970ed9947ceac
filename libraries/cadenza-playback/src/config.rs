//! Player configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Duration reported when neither the decoder nor the metadata know (3 minutes)
pub const DEFAULT_FALLBACK_DURATION_MS: u64 = 180_000;

/// Output gain while ducked for another application
pub const DEFAULT_DUCK_VOLUME: f32 = 0.3;

/// Configuration for the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Sentinel duration used by `duration()` as the last fallback (default: 180000)
    pub fallback_duration_ms: u64,

    /// Output gain while ducked (0.0 - 1.0, default: 0.3)
    pub duck_volume: f32,

    /// Progress poll interval (default: 1000)
    pub progress_interval_ms: u64,

    /// How long a progress query waits for the engine thread (default: 250)
    pub query_timeout_ms: u64,

    /// Consecutive failed items before auto-skip gives up
    ///
    /// `None` (default) allows exactly one pass over the catalog.
    pub max_consecutive_failures: Option<usize>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fallback_duration_ms: DEFAULT_FALLBACK_DURATION_MS,
            duck_volume: DEFAULT_DUCK_VOLUME,
            progress_interval_ms: 1000,
            query_timeout_ms: 250,
            max_consecutive_failures: None,
        }
    }
}

impl PlayerConfig {
    /// Clamp out-of-range values to something usable
    #[must_use]
    pub fn validate(mut self) -> Self {
        if self.fallback_duration_ms == 0 {
            tracing::warn!("fallback_duration_ms of 0 would disable seeking, using default");
            self.fallback_duration_ms = DEFAULT_FALLBACK_DURATION_MS;
        }
        if !self.duck_volume.is_finite() {
            self.duck_volume = DEFAULT_DUCK_VOLUME;
        }
        self.duck_volume = self.duck_volume.clamp(0.0, 1.0);
        self.progress_interval_ms = self.progress_interval_ms.max(10);
        self.query_timeout_ms = self.query_timeout_ms.max(1);
        if self.max_consecutive_failures == Some(0) {
            self.max_consecutive_failures = Some(1);
        }
        self
    }

    /// Progress poll interval
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Engine query timeout
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Failure cap for a catalog of `catalog_len` items
    pub fn failure_cap(&self, catalog_len: usize) -> usize {
        let pass = catalog_len.max(1);
        self.max_consecutive_failures
            .map_or(pass, |cap| cap.min(pass))
    }
}
