//! Sync status published to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The engine's current state. Exactly one value is live at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Sync is turned off.
    Disabled,
    /// Waiting for the next cycle.
    Idle { last_sync: Option<DateTime<Utc>> },
    /// A cycle is running.
    Syncing,
    /// The last cycle failed. `last_sync` is the last successful one.
    Error {
        message: String,
        last_sync: Option<DateTime<Utc>>,
    },
}

impl SyncStatus {
    /// Time of the last successful cycle, where the state carries it.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        match self {
            SyncStatus::Idle { last_sync } | SyncStatus::Error { last_sync, .. } => *last_sync,
            SyncStatus::Disabled | SyncStatus::Syncing => None,
        }
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error { .. })
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Disabled => f.write_str("disabled"),
            SyncStatus::Idle { last_sync: None } => f.write_str("idle (never synced)"),
            SyncStatus::Idle {
                last_sync: Some(at),
            } => write!(f, "idle (last sync {})", at.to_rfc3339()),
            SyncStatus::Syncing => f.write_str("syncing"),
            SyncStatus::Error { message, .. } => write!(f, "error: {message}"),
        }
    }
}
