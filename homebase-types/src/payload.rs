//! Sync payloads and per-record sync metadata.

use crate::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Computes the content checksum of a serialized snapshot.
///
/// SHA-256 over the raw bytes, lower-case hex. Equal bytes always give an
/// equal checksum; any byte difference gives a different one.
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A serialized snapshot of one record plus its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub id: RecordId,
    pub data: Vec<u8>,
    pub checksum: String,
}

impl SyncPayload {
    /// Builds a payload from snapshot bytes, computing the checksum.
    pub fn new(id: RecordId, data: Vec<u8>) -> Self {
        let checksum = checksum(&data);
        Self { id, data, checksum }
    }

    /// Serializes a value as JSON and wraps it in a payload.
    pub fn from_json<T: Serialize>(id: RecordId, value: &T) -> crate::Result<Self> {
        Ok(Self::new(id, serde_json::to_vec(value)?))
    }

    /// Returns true if the stored checksum matches the data.
    pub fn verify(&self) -> bool {
        checksum(&self.data) == self.checksum
    }
}

/// What the engine remembers about one record after a confirmed push or an
/// applied pull.
///
/// Presence means the record is believed to exist both locally and remotely
/// as of `last_synced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub checksum: String,
    pub last_synced: DateTime<Utc>,
}

impl RecordMetadata {
    /// Creates metadata for a record synced at `last_synced`.
    pub fn new(checksum: impl Into<String>, last_synced: DateTime<Utc>) -> Self {
        Self {
            checksum: checksum.into(),
            last_synced,
        }
    }
}
