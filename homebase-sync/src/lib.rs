//! Checksum-based bidirectional sync for Homebase.
//!
//! The [`SyncEngine`] reconciles local records with a remote record store:
//!
//! 1. Pick the adapters whose feature group is enabled.
//! 2. Provision one remote namespace per active entity kind.
//! 3. Push: diff each kind's local snapshots against stored checksums and
//!    send dirty records and deletions.
//! 4. Pull: fetch remote changes since each kind's cursor and apply them
//!    last-writer-wins on the remote modification time. Remote deletions
//!    always win.
//!
//! At most one cycle runs at a time; concurrent calls are coalesced. Status
//! and configuration are observable through replay-latest subscriptions.
//!
//! ```rust,ignore
//! let registry = AdapterRegistry::new()
//!     .with_model::<Item>(items)
//!     .with_model::<Transaction>(transactions);
//! let state = Arc::new(SqliteStateStore::open("sync.db")?);
//! let engine = SyncEngine::new(registry, Some(remote), state, SyncSettings::default())?;
//!
//! let mut status = engine.subscribe_status();
//! engine.synchronize().await;
//! ```

pub mod adapter;
pub mod broadcast;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod reconcile;
pub mod registry;
pub mod remote;
pub mod scheduler;
pub mod settings;
pub mod status;

pub use adapter::{EntityAdapter, LocalSnapshot, ModelAdapter};
pub use broadcast::{Broadcaster, Subscription};
pub use config::{ConfigStore, SyncConfiguration};
pub use cursor::{Cursor, CursorStore};
pub use engine::{SyncEngine, SyncReport};
pub use error::{SyncError, SyncResult};
pub use metadata::{MetadataMap, MetadataStore};
pub use reconcile::{LocalDiff, RemoteDecision, decide};
pub use registry::AdapterRegistry;
pub use remote::{
    BatchOutcome, FetchRequest, MemoryRemoteStore, RecordOutcome, RemoteChange, RemoteDelta,
    RemoteOp, RemoteRecord, RemoteStats, RemoteStore,
};
pub use scheduler::{SchedulerCommand, SchedulerHandle, SyncScheduler};
pub use settings::SyncSettings;
pub use status::SyncStatus;
