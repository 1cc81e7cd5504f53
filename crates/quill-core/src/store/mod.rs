//! Local durable store: contracts and the sqlite driver

mod sqlite;

pub use sqlite::{SqliteBackend, SqliteCategoryStore, SqliteNoteStore};

use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Entity, SyncState};

/// A row as stored locally: the entity plus its reconciliation bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored<E> {
    pub entity: E,
    pub state: SyncState,
    /// Whether this record was ever confirmed remote. Rows that never were
    /// can be hard-deleted locally with nothing left to reconcile.
    pub synced_once: bool,
}

/// On-device durable cache for one entity collection.
///
/// All operations are synchronous; callers never wait on network here.
/// Tombstoned (`PendingDelete`) rows are excluded from active reads but stay
/// physically present until a sync pass confirms the remote delete.
pub trait LocalStore<E: Entity>: Send + Sync {
    /// List records excluding tombstoned rows
    fn list_active(&self) -> Result<Vec<E>>;

    /// Point lookup excluding tombstoned rows
    fn get(&self, id: &str) -> Result<Option<E>>;

    /// Point lookup regardless of state
    fn get_any(&self, id: &str) -> Result<Option<Stored<E>>>;

    /// Insert or replace a row with the given state
    fn upsert(&self, entity: &E, state: SyncState) -> Result<()>;

    /// Move an existing row to a new state
    fn set_state(&self, id: &str, state: SyncState) -> Result<()>;

    /// Tombstone a row (`PendingDelete`)
    fn soft_delete(&self, id: &str) -> Result<()>;

    /// Physically remove a row
    fn hard_delete(&self, id: &str) -> Result<()>;

    /// List rows in the given state, tombstoned rows included
    fn list_where(&self, state: SyncState) -> Result<Vec<E>>;

    /// Merge a remote snapshot into the cache: incoming rows land as
    /// `Synced`, stale synced rows are dropped, and rows with unconfirmed
    /// local work (`Pending`/`PendingDelete`) are never touched.
    fn replace_synced(&self, entities: &[E]) -> Result<()>;

    /// Change notifications; the counter bumps on every local write
    fn watch(&self) -> watch::Receiver<u64>;

    /// Number of rows with unconfirmed remote work
    fn pending_count(&self) -> Result<usize> {
        Ok(self.list_where(SyncState::Pending)?.len()
            + self.list_where(SyncState::PendingDelete)?.len())
    }
}
