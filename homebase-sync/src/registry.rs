//! The canonical table of entity adapters, indexed by kind.

use crate::adapter::{EntityAdapter, ModelAdapter};
use crate::config::SyncConfiguration;
use homebase_model::SyncModel;
use homebase_storage::RecordStore;
use homebase_types::EntityKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// One adapter per entity kind, registered once at startup.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<EntityKind, Arc<dyn EntityAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter, replacing any earlier one for the same kind.
    pub fn register(&mut self, adapter: Arc<dyn EntityAdapter>) {
        let kind = adapter.kind();
        if self.adapters.insert(kind, adapter).is_some() {
            warn!("Replacing previously registered adapter for {}", kind);
        }
    }

    /// Registers a [`ModelAdapter`] for `M` over the given store.
    pub fn with_model<M: SyncModel>(mut self, store: Arc<dyn RecordStore<M>>) -> Self {
        self.register(Arc::new(ModelAdapter::new(store)));
        self
    }

    /// The adapter for `kind`, if registered.
    pub fn get(&self, kind: EntityKind) -> Option<&Arc<dyn EntityAdapter>> {
        self.adapters.get(&kind)
    }

    /// Registered kinds, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.adapters.keys().copied()
    }

    /// Adapters whose feature group is enabled in `config`.
    pub fn active(&self, config: &SyncConfiguration) -> Vec<Arc<dyn EntityAdapter>> {
        self.adapters
            .iter()
            .filter(|(kind, _)| config.is_kind_active(**kind))
            .map(|(_, adapter)| Arc::clone(adapter))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
