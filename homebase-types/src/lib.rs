//! Core type definitions for Homebase sync.
//!
//! This crate defines the fundamental, entity-agnostic types shared by the
//! storage and sync layers:
//! - Record identifiers (UUID v7)
//! - The fixed set of entity kinds and the feature groups they belong to
//! - Remote namespace identifiers
//! - Sync payloads (serialized snapshot plus content checksum)
//! - Per-record sync metadata
//!
//! Domain models (inventory items, transactions, habits) live in
//! `homebase-model`, not here.

mod ids;
mod kind;
mod payload;

pub use ids::RecordId;
pub use kind::{EntityKind, FeatureGroup, NamespaceId};
pub use payload::{RecordMetadata, SyncPayload, checksum};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid record id {input:?}: {source}")]
    InvalidRecordId {
        input: String,
        #[source]
        source: uuid::Error,
    },

    #[error("unknown feature group: {0}")]
    UnknownFeature(String),

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
}
