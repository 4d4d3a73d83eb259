//! Engine tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operational settings for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Maximum upserts (and, separately, deletes) per remote write call.
    pub push_batch_size: usize,
    /// Capacity of the queue carrying remote changes into the engine.
    pub pull_channel_capacity: usize,
    /// How often the background scheduler runs a cycle (in seconds).
    pub poll_interval_secs: u64,
}

impl SyncSettings {
    /// Background poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            push_batch_size: 200,
            pull_channel_capacity: 64,
            poll_interval_secs: 15 * 60,
        }
    }
}
