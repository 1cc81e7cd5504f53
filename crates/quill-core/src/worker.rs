//! Sync worker: drains pending local mutations against the remote store

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Entity, EntityKind, SyncState};
use crate::remote::RemoteStore;
use crate::store::LocalStore;

/// One schedulable unit of reconciliation work
#[async_trait]
pub trait SyncRunner: Send + Sync {
    /// Which entity kind this runner reconciles
    fn kind(&self) -> EntityKind;

    /// Execute one sync pass
    async fn run(&self) -> Result<()>;
}

/// Reconciles one entity collection's pending local mutations.
///
/// A pass drains tombstones first, then pending creates/updates, and aborts
/// on the first remote failure. Deletes go first so a failed delete is never
/// masked by later successful creates; aborting re-derives the remaining
/// pending set from durable state on the next pass, so no separate failure
/// bookkeeping exists.
pub struct SyncWorker<E: Entity> {
    local: Arc<dyn LocalStore<E>>,
    remote: Arc<dyn RemoteStore<E>>,
}

impl<E: Entity> SyncWorker<E> {
    pub fn new(local: Arc<dyn LocalStore<E>>, remote: Arc<dyn RemoteStore<E>>) -> Self {
        Self { local, remote }
    }

    /// Run one sync pass; `SyncFailed` asks the scheduler to retry later
    pub async fn run_pass(&self) -> Result<()> {
        self.drain_deletes().await?;
        self.drain_pending().await?;
        tracing::debug!(kind = %E::KIND, "sync pass complete");
        Ok(())
    }

    /// Phase 1: confirm remote deletes, then drop the local tombstones
    async fn drain_deletes(&self) -> Result<()> {
        let doomed = self.local.list_where(SyncState::PendingDelete)?;
        if !doomed.is_empty() {
            tracing::debug!(kind = %E::KIND, count = doomed.len(), "draining pending deletes");
        }
        for entity in doomed {
            let id = entity.id();
            if let Err(error) = self.remote.delete(&id).await {
                tracing::warn!(kind = %E::KIND, id, %error, "remote delete failed; aborting pass");
                return Err(Error::SyncFailed(format!(
                    "remote delete of {id} failed: {error}"
                )));
            }
            self.local.hard_delete(&id)?;
        }
        Ok(())
    }

    /// Phase 2: push pending creates/updates as idempotent upserts
    async fn drain_pending(&self) -> Result<()> {
        let pending = self.local.list_where(SyncState::Pending)?;
        if !pending.is_empty() {
            tracing::debug!(kind = %E::KIND, count = pending.len(), "draining pending upserts");
        }
        for entity in pending {
            let id = entity.id();
            if let Err(error) = self.remote.upsert(&entity).await {
                tracing::warn!(kind = %E::KIND, id, %error, "remote upsert failed; aborting pass");
                return Err(Error::SyncFailed(format!(
                    "remote upsert of {id} failed: {error}"
                )));
            }
            self.local.set_state(&id, SyncState::Synced)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> SyncRunner for SyncWorker<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    async fn run(&self) -> Result<()> {
        self.run_pass().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityMonitor;
    use crate::models::{Category, Note};
    use crate::repository::SyncRepository;
    use crate::store::{SqliteBackend, SqliteCategoryStore, SqliteNoteStore};
    use crate::testing::MockRemoteStore;
    use pretty_assertions::assert_eq;

    fn note_setup() -> (Arc<SqliteNoteStore>, Arc<MockRemoteStore<Note>>, SyncWorker<Note>) {
        let store = Arc::new(SqliteNoteStore::new(SqliteBackend::open_in_memory().unwrap()));
        let remote = Arc::new(MockRemoteStore::new());
        let worker = SyncWorker::new(
            Arc::clone(&store) as Arc<dyn LocalStore<Note>>,
            Arc::clone(&remote) as Arc<dyn RemoteStore<Note>>,
        );
        (store, remote, worker)
    }

    #[tokio::test]
    async fn pass_promotes_pending_to_synced_exactly_once() {
        let (store, remote, worker) = note_setup();
        let note = Note::new("Offline note", "", None);
        store.upsert(&note, SyncState::Pending).unwrap();

        worker.run_pass().await.unwrap();

        let stored = store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Synced);
        assert!(remote.contains(&note.id.as_str()));
        assert_eq!(remote.upsert_calls(), 1);

        // Re-running a successful pass must not re-issue remote creates
        worker.run_pass().await.unwrap();
        assert_eq!(remote.upsert_calls(), 1);
    }

    #[tokio::test]
    async fn pass_confirms_delete_then_drops_tombstone() {
        let (store, remote, worker) = note_setup();
        let note = Note::new("Doomed", "", None);
        remote.seed(vec![note.clone()]);
        store.upsert(&note, SyncState::Synced).unwrap();
        store.soft_delete(&note.id.as_str()).unwrap();

        worker.run_pass().await.unwrap();

        assert!(store.get_any(&note.id.as_str()).unwrap().is_none());
        assert!(!remote.contains(&note.id.as_str()));
        assert_eq!(remote.delete_calls(), 1);
    }

    #[tokio::test]
    async fn failed_delete_leaves_tombstone_pending_delete() {
        let (store, remote, worker) = note_setup();
        let note = Note::new("Stuck", "", None);
        store.upsert(&note, SyncState::Synced).unwrap();
        store.soft_delete(&note.id.as_str()).unwrap();
        remote.fail_deletes(true);

        let result = worker.run_pass().await;
        assert!(matches!(result, Err(Error::SyncFailed(_))));

        // Never transitions to Synced; stays tombstoned for the next pass
        let stored = store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::PendingDelete);
    }

    #[tokio::test]
    async fn failed_delete_phase_aborts_before_upserts() {
        let store = Arc::new(SqliteCategoryStore::new(
            SqliteBackend::open_in_memory().unwrap(),
        ));
        let remote = Arc::new(MockRemoteStore::new());
        let worker = SyncWorker::new(
            Arc::clone(&store) as Arc<dyn LocalStore<Category>>,
            Arc::clone(&remote) as Arc<dyn RemoteStore<Category>>,
        );

        let doomed = Category::new("Doomed");
        store.upsert(&doomed, SyncState::Synced).unwrap();
        store.soft_delete(&doomed.id.as_str()).unwrap();
        let created = Category::new("New");
        store.upsert(&created, SyncState::Pending).unwrap();

        remote.fail_deletes(true); // upserts would succeed, but must not run

        let result = worker.run_pass().await;
        assert!(matches!(result, Err(Error::SyncFailed(_))));

        let doomed_row = store.get_any(&doomed.id.as_str()).unwrap().unwrap();
        assert_eq!(doomed_row.state, SyncState::PendingDelete);
        let created_row = store.get_any(&created.id.as_str()).unwrap().unwrap();
        assert_eq!(created_row.state, SyncState::Pending);
        assert_eq!(remote.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn failed_upsert_keeps_record_pending() {
        let (store, remote, worker) = note_setup();
        let note = Note::new("Unlucky", "", None);
        store.upsert(&note, SyncState::Pending).unwrap();
        remote.fail_upserts(true);

        let result = worker.run_pass().await;
        assert!(matches!(result, Err(Error::SyncFailed(_))));

        let stored = store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Pending);
        assert_eq!(remote.doc_count(), 0);
    }

    #[tokio::test]
    async fn offline_create_then_reconnect_syncs_once() {
        let (store, remote, worker) = note_setup();
        let connectivity = ConnectivityMonitor::new(false);
        let repository = SyncRepository::new(
            Arc::clone(&store) as Arc<dyn LocalStore<Note>>,
            Arc::clone(&remote) as Arc<dyn RemoteStore<Note>>,
            Arc::new(connectivity.clone()),
        );

        // Created while offline: visible locally, tagged Pending
        let note = repository
            .create(Note::new("Written offline", "", None))
            .unwrap();
        let listed = repository.list(crate::FetchStrategy::Cached).await.unwrap();
        assert_eq!(listed.len(), 1);
        let stored = store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Pending);

        // Connectivity returns; one pass reconciles it
        connectivity.set_online(true);
        worker.run_pass().await.unwrap();

        assert_eq!(remote.upsert_calls(), 1);
        assert!(remote.contains(&note.id.as_str()));
        let stored = store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Synced);
    }
}
