//! Remote record store abstraction.
//!
//! Defines the interface the engine uses to reach the cloud record store,
//! and the wire shapes exchanged with it. Concrete transports live outside
//! this crate; [`memory::MemoryRemoteStore`] is an in-process implementation.

pub mod memory;

use crate::cursor::Cursor;
use crate::error::SyncResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homebase_types::{FeatureGroup, NamespaceId, RecordId, SyncPayload};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use memory::{MemoryRemoteStore, RemoteOp, RemoteStats};

/// A local record on its way to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub id: RecordId,
    pub data: Vec<u8>,
    pub checksum: String,
    pub feature: FeatureGroup,
    pub modified_at: DateTime<Utc>,
}

impl RemoteRecord {
    /// Wraps a local payload for upload.
    pub fn from_payload(payload: SyncPayload, feature: FeatureGroup, modified_at: DateTime<Utc>) -> Self {
        Self {
            id: payload.id,
            data: payload.data,
            checksum: payload.checksum,
            feature,
            modified_at,
        }
    }
}

/// A changed record reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDelta {
    pub id: RecordId,
    pub data: Vec<u8>,
    pub checksum: String,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl RemoteDelta {
    /// The snapshot carried by this delta.
    pub fn payload(&self) -> SyncPayload {
        SyncPayload {
            id: self.id,
            data: self.data.clone(),
            checksum: self.checksum.clone(),
        }
    }
}

/// Outcome of one record within a non-atomic remote write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub id: RecordId,
    /// `None` when the record was accepted.
    pub error: Option<String>,
}

impl RecordOutcome {
    pub fn accepted(id: RecordId) -> Self {
        Self { id, error: None }
    }

    pub fn rejected(id: RecordId, error: impl Into<String>) -> Self {
        Self {
            id,
            error: Some(error.into()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-record results of a `save_and_delete` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub saved: Vec<RecordOutcome>,
    pub deleted: Vec<RecordOutcome>,
}

/// One namespace to fetch changes for, starting after `cursor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub namespace: NamespaceId,
    pub cursor: Option<Cursor>,
}

/// A message posted by the remote store while fetching changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteChange {
    /// A record was created or modified.
    Changed {
        namespace: NamespaceId,
        delta: RemoteDelta,
    },
    /// A record was deleted.
    Deleted { namespace: NamespaceId, id: RecordId },
    /// Everything in `namespace` up to this cursor has been delivered.
    CursorAdvanced {
        namespace: NamespaceId,
        cursor: Cursor,
    },
}

/// The cloud record store collaborator.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Creates the namespace if it does not exist yet.
    async fn ensure_namespace(&self, namespace: &NamespaceId) -> SyncResult<()>;

    /// Saves and deletes records in one namespace.
    ///
    /// Non-atomic: each record succeeds or fails independently and is
    /// reported in the returned outcome. `Err` means the call as a whole
    /// failed and nothing should be assumed written.
    async fn save_and_delete(
        &self,
        namespace: &NamespaceId,
        to_save: Vec<RemoteRecord>,
        to_delete: Vec<RecordId>,
    ) -> SyncResult<BatchOutcome>;

    /// Streams changes for every requested namespace into `sink`.
    ///
    /// Each namespace's changes are followed by a
    /// [`RemoteChange::CursorAdvanced`]. Returns once everything has been
    /// posted, or with the first error.
    async fn fetch_changes(
        &self,
        requests: Vec<FetchRequest>,
        sink: mpsc::Sender<RemoteChange>,
    ) -> SyncResult<()>;
}
