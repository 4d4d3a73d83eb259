//! User-facing sync configuration and its persistent store.
//!
//! Persisted as `{"isEnabled": bool, "featurePermissions": {"<feature>": bool}}`.
//! Every known feature group always has an entry in memory; groups missing
//! from the persisted JSON default to enabled, unknown keys are dropped.

use crate::error::{SyncError, SyncResult};
use homebase_storage::StateStore;
use homebase_types::{EntityKind, FeatureGroup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub(crate) const CONFIG_KEY: &str = "configuration";

/// Whether sync is on, and which feature groups may sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredConfiguration", into = "StoredConfiguration")]
pub struct SyncConfiguration {
    is_enabled: bool,
    feature_permissions: BTreeMap<FeatureGroup, bool>,
}

impl SyncConfiguration {
    /// Whether sync is globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Whether a feature group is permitted to sync.
    pub fn is_feature_enabled(&self, group: FeatureGroup) -> bool {
        self.feature_permissions.get(&group).copied().unwrap_or(true)
    }

    /// Whether records of this kind take part in a cycle.
    pub fn is_kind_active(&self, kind: EntityKind) -> bool {
        self.is_feature_enabled(kind.feature())
    }

    /// Permission per feature group. Contains every known group.
    pub fn feature_permissions(&self) -> &BTreeMap<FeatureGroup, bool> {
        &self.feature_permissions
    }

    /// Decodes persisted configuration.
    pub fn from_json(bytes: &[u8]) -> SyncResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::Configuration(e.to_string()))
    }

    /// Encodes configuration for persistence.
    pub fn to_json(&self) -> SyncResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            is_enabled: enabled,
            ..self.clone()
        }
    }

    fn with_feature(&self, group: FeatureGroup, enabled: bool) -> Self {
        let mut next = self.clone();
        next.feature_permissions.insert(group, enabled);
        next
    }
}

impl Default for SyncConfiguration {
    fn default() -> Self {
        Self {
            is_enabled: true,
            feature_permissions: FeatureGroup::ALL.into_iter().map(|g| (g, true)).collect(),
        }
    }
}

/// On-disk shape of [`SyncConfiguration`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfiguration {
    #[serde(default = "enabled_by_default")]
    is_enabled: bool,
    #[serde(default)]
    feature_permissions: BTreeMap<String, bool>,
}

fn enabled_by_default() -> bool {
    true
}

impl From<StoredConfiguration> for SyncConfiguration {
    fn from(stored: StoredConfiguration) -> Self {
        let mut config = SyncConfiguration {
            is_enabled: stored.is_enabled,
            ..Default::default()
        };
        for (key, enabled) in stored.feature_permissions {
            match key.parse::<FeatureGroup>() {
                Ok(group) => {
                    config.feature_permissions.insert(group, enabled);
                }
                Err(_) => debug!("Ignoring unknown feature permission {:?}", key),
            }
        }
        config
    }
}

impl From<SyncConfiguration> for StoredConfiguration {
    fn from(config: SyncConfiguration) -> Self {
        Self {
            is_enabled: config.is_enabled,
            feature_permissions: config
                .feature_permissions
                .into_iter()
                .map(|(group, enabled)| (group.id().to_string(), enabled))
                .collect(),
        }
    }
}

/// Loads, mutates and persists the [`SyncConfiguration`].
///
/// Every mutation is written to the state store before it becomes visible.
pub struct ConfigStore {
    state: Arc<dyn StateStore>,
    current: SyncConfiguration,
}

impl ConfigStore {
    /// Loads the persisted configuration, creating defaults on first run.
    ///
    /// Malformed configuration is replaced by defaults.
    pub fn load(state: Arc<dyn StateStore>) -> SyncResult<Self> {
        let loaded = match state.load(CONFIG_KEY)? {
            Some(bytes) => match SyncConfiguration::from_json(&bytes) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Persisted sync configuration unreadable, using defaults: {}", e);
                    None
                }
            },
            None => {
                info!("No sync configuration found, creating defaults");
                None
            }
        };

        let store = Self {
            state,
            current: loaded.clone().unwrap_or_default(),
        };
        if loaded.is_none() {
            store.persist(&store.current)?;
        }
        Ok(store)
    }

    /// The current configuration.
    pub fn current(&self) -> &SyncConfiguration {
        &self.current
    }

    /// Sets the global switch. Returns true if the value changed.
    pub fn set_enabled(&mut self, enabled: bool) -> SyncResult<bool> {
        if self.current.is_enabled == enabled {
            return Ok(false);
        }
        self.replace(self.current.with_enabled(enabled))?;
        Ok(true)
    }

    /// Sets one feature group's permission. Returns true if the value changed.
    pub fn set_feature_enabled(&mut self, group: FeatureGroup, enabled: bool) -> SyncResult<bool> {
        if self.current.is_feature_enabled(group) == enabled {
            return Ok(false);
        }
        self.replace(self.current.with_feature(group, enabled))?;
        Ok(true)
    }

    fn replace(&mut self, next: SyncConfiguration) -> SyncResult<()> {
        self.persist(&next)?;
        self.current = next;
        Ok(())
    }

    fn persist(&self, config: &SyncConfiguration) -> SyncResult<()> {
        self.state.save(CONFIG_KEY, &config.to_json()?)?;
        Ok(())
    }
}
