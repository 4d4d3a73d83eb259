//! Error types for the sync layer.

use homebase_storage::StorageError;
use homebase_types::{EntityKind, RecordId};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Persisted configuration could not be read.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// One record could not be encoded or decoded.
    #[error(
        "codec error for {kind} record {}: {message}",
        .id.map_or_else(|| "<unknown>".to_string(), |id| id.to_string())
    )]
    Codec {
        kind: EntityKind,
        id: Option<RecordId>,
        message: String,
    },

    /// Network, auth or quota failure talking to the remote store.
    #[error("remote operation failed: {0}")]
    Remote(String),

    /// The local persistence collaborator or the state store failed.
    #[error("local persistence error: {0}")]
    LocalPersistence(#[from] StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A task marshalled onto the blocking pool panicked or was cancelled.
    #[error("local task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,
}

impl SyncError {
    /// Creates a remote error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    /// Creates a codec error for one record.
    pub fn codec(kind: EntityKind, id: Option<RecordId>, message: impl ToString) -> Self {
        Self::Codec {
            kind,
            id,
            message: message.to_string(),
        }
    }

    /// Returns true if the failure concerns a single record and must not
    /// abort the surrounding batch.
    pub fn is_record_scoped(&self) -> bool {
        matches!(self, SyncError::Codec { .. })
    }
}
