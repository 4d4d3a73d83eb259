//! Record identity.
//!
//! A [`RecordId`] names one record everywhere the engine tracks it: the local
//! record store, the remote namespace, and the per-kind metadata map. All of
//! them use the same text form, the lowercase hyphenated UUID, so an id read
//! back from any of them compares equal to the one that was written. That text
//! form is the key of the persisted metadata maps:
//!
//! ```text
//! {"0190f3c2-6a4b-7c11-9d2e-3f5a6b7c8d9e": {"checksum": "...", "lastSynced": "..."}}
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of one synchronized record, stable across devices.
///
/// Ids minted here are UUID v7 and sort by creation time. Ids arriving from
/// other devices are accepted in any UUID version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Mints an id for a record created on this device.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses the text form used in metadata keys and remote records.
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|source| Error::InvalidRecordId {
                input: s.to_owned(),
                source,
            })
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
