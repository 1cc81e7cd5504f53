//! Per-record reconciliation state

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Reconciliation status of a locally stored record.
///
/// Exactly one state holds per row at any time. The tag is persisted in the
/// local store's `sync_state` column and drives which rows a sync pass picks
/// up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncState {
    /// Local copy matches (or is derived from) the last known remote copy
    Synced,
    /// Local create or update not yet confirmed remote
    Pending,
    /// Tombstoned locally; the remote delete has not yet been confirmed
    PendingDelete,
}

impl SyncState {
    /// Tag stored in the local `sync_state` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "SYNCED",
            Self::Pending => "PENDING",
            Self::PendingDelete => "PENDING_DELETE",
        }
    }

    /// Whether this record still has unconfirmed remote work
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending | Self::PendingDelete)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SYNCED" => Ok(Self::Synced),
            "PENDING" => Ok(Self::Pending),
            "PENDING_DELETE" => Ok(Self::PendingDelete),
            other => Err(Error::LocalStore(format!("unknown sync state tag: {other}"))),
        }
    }
}
