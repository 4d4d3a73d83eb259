//! Storage layer for Homebase sync.
//!
//! Two independent concerns live here:
//!
//! - [`RecordStore`] is the local persistence collaborator for one domain
//!   model. The sync engine never touches it directly; entity adapters
//!   marshal every call onto a blocking worker so the store can keep its
//!   own single-writer discipline. [`MemoryRecordStore`] is the in-process
//!   implementation.
//! - [`StateStore`] persists the engine's own state (configuration,
//!   cursors, per-record metadata) as opaque blobs under string keys.
//!   [`SqliteStateStore`] keeps them in a single SQLite table;
//!   [`MemoryStateStore`] keeps them in a map.

mod error;
mod record_store;
mod state_store;

pub use error::{StorageError, StorageResult};
pub use record_store::{MemoryRecordStore, RecordStore};
pub use state_store::{MemoryStateStore, SqliteStateStore, StateStore};
