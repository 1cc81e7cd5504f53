//! Entity repositories: strategy-driven reads, pending-tagged writes

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::connectivity::Connectivity;
use crate::error::{Error, Result};
use crate::models::{Entity, SyncState};
use crate::remote::RemoteStore;
use crate::store::LocalStore;

/// Policy determining local/remote precedence for a read.
///
/// Every strategy leaves the local store consistent with whatever data was
/// actually returned: a successful remote read always lands in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Local immediately; when online, refresh the cache from remote in the
    /// background (local-first, eventually refreshed)
    Fast,
    /// Remote first; offline or remote failure is an error, no local fallback
    Fresh,
    /// Local only; never touches remote regardless of connectivity
    Cached,
    /// Remote first; any remote failure silently falls back to the cache
    Fallback,
    /// One-shot remote pull that overwrites the cache; like `Fresh` but for
    /// explicit refresh triggers rather than continuous observation
    Synced,
}

/// Uniform read/write API over one entity's local and remote stores.
///
/// Writes are synchronous-to-local and asynchronous-to-remote: `create`,
/// `update`, and `delete` return as soon as the local row lands, tagged
/// `Pending`/`PendingDelete` for the sync worker to reconcile out-of-band.
pub struct SyncRepository<E: Entity> {
    local: Arc<dyn LocalStore<E>>,
    remote: Arc<dyn RemoteStore<E>>,
    connectivity: Arc<dyn Connectivity>,
}

impl<E: Entity> Clone for SyncRepository<E> {
    fn clone(&self) -> Self {
        Self {
            local: Arc::clone(&self.local),
            remote: Arc::clone(&self.remote),
            connectivity: Arc::clone(&self.connectivity),
        }
    }
}

impl<E: Entity> SyncRepository<E> {
    pub fn new(
        local: Arc<dyn LocalStore<E>>,
        remote: Arc<dyn RemoteStore<E>>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            local,
            remote,
            connectivity,
        }
    }

    /// Write a new record locally as `Pending`.
    ///
    /// Validation failures surface before anything touches storage.
    pub fn create(&self, entity: E) -> Result<E> {
        entity.validate()?;
        self.local.upsert(&entity, SyncState::Pending)?;
        tracing::debug!(kind = %E::KIND, id = entity.id(), "created local record");
        Ok(entity)
    }

    /// Replace an existing record locally as `Pending`, carrying immutable
    /// fields (e.g. `created_at`) over from the stored row.
    pub fn update(&self, mut entity: E) -> Result<E> {
        entity.validate()?;
        let id = entity.id();
        let stored = self
            .local
            .get_any(&id)?
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        if stored.state == SyncState::PendingDelete {
            return Err(Error::NotFound(id));
        }
        entity.carry_over(&stored.entity);
        self.local.upsert(&entity, SyncState::Pending)?;
        tracing::debug!(kind = %E::KIND, id, "updated local record");
        Ok(entity)
    }

    /// Delete a record.
    ///
    /// Rows that were never confirmed remote are hard-deleted immediately
    /// (there is nothing to reconcile); everything else is tombstoned as
    /// `PendingDelete` until a sync pass confirms the remote delete.
    pub fn delete(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(Error::Validation("id cannot be empty".to_string()));
        }
        let stored = self
            .local
            .get_any(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if stored.state == SyncState::PendingDelete {
            return Err(Error::NotFound(id.to_string()));
        }
        if stored.synced_once {
            self.local.soft_delete(id)?;
            tracing::debug!(kind = %E::KIND, id, "tombstoned record for remote delete");
        } else {
            self.local.hard_delete(id)?;
            tracing::debug!(kind = %E::KIND, id, "record never synced; deleted locally");
        }
        Ok(())
    }

    /// Point lookup following the strategy
    pub async fn get_by_id(&self, id: &str, strategy: FetchStrategy) -> Result<E> {
        if id.trim().is_empty() {
            return Err(Error::Validation("id cannot be empty".to_string()));
        }
        match strategy {
            FetchStrategy::Cached => self.local_get(id),
            FetchStrategy::Fast => {
                if let Some(entity) = self.local.get(id)? {
                    if self.connectivity.is_online() {
                        self.spawn_document_refresh(id);
                    }
                    return Ok(entity);
                }
                if self.connectivity.is_online() {
                    if let Some(entity) = self.remote.fetch(id).await? {
                        self.cache_remote(&entity)?;
                        return Ok(entity);
                    }
                }
                Err(Error::NotFound(id.to_string()))
            }
            FetchStrategy::Fresh | FetchStrategy::Synced => {
                if !self.connectivity.is_online() {
                    return Err(Error::offline());
                }
                match self.remote.fetch(id).await? {
                    Some(entity) => {
                        self.cache_remote(&entity)?;
                        Ok(entity)
                    }
                    None => Err(Error::NotFound(id.to_string())),
                }
            }
            FetchStrategy::Fallback => {
                if self.connectivity.is_online() {
                    match self.remote.fetch(id).await {
                        Ok(Some(entity)) => {
                            self.cache_remote(&entity)?;
                            return Ok(entity);
                        }
                        Ok(None) => {}
                        Err(error) => {
                            tracing::debug!(kind = %E::KIND, id, %error, "remote fetch failed; falling back to cache");
                        }
                    }
                }
                self.local_get(id)
            }
        }
    }

    /// One-shot list following the strategy
    pub async fn list(&self, strategy: FetchStrategy) -> Result<Vec<E>> {
        match strategy {
            FetchStrategy::Cached => self.local.list_active(),
            FetchStrategy::Fast => {
                let snapshot = self.local.list_active()?;
                if self.connectivity.is_online() {
                    self.spawn_collection_refresh();
                }
                Ok(snapshot)
            }
            FetchStrategy::Fresh | FetchStrategy::Synced => {
                if !self.connectivity.is_online() {
                    return Err(Error::offline());
                }
                let entities = self.remote.list().await?;
                self.local.replace_synced(&entities)?;
                Ok(entities)
            }
            FetchStrategy::Fallback => {
                if self.connectivity.is_online() {
                    match self.remote.list().await {
                        Ok(entities) => {
                            self.local.replace_synced(&entities)?;
                            return Ok(entities);
                        }
                        Err(error) => {
                            tracing::debug!(kind = %E::KIND, %error, "remote list failed; falling back to cache");
                        }
                    }
                }
                self.local.list_active()
            }
        }
    }

    /// Force a one-shot remote pull into the cache (pull-to-refresh)
    pub async fn refresh(&self) -> Result<()> {
        self.list(FetchStrategy::Synced).await.map(|_| ())
    }

    /// Number of rows with unconfirmed remote work
    pub fn pending_count(&self) -> Result<usize> {
        self.local.pending_count()
    }

    /// Continuous read following the strategy.
    ///
    /// Emits an initial result per the strategy, then re-emits the active
    /// local set on every local store change (including the completion of a
    /// strategy-mandated remote refresh). Dropping the subscription cancels
    /// the underlying task; no emissions happen after that.
    ///
    /// Must be called within a Tokio runtime.
    pub fn observe(&self, strategy: FetchStrategy) -> Subscription<E> {
        let (tx, rx) = mpsc::channel(16);
        let local = Arc::clone(&self.local);
        let remote = Arc::clone(&self.remote);
        let connectivity = Arc::clone(&self.connectivity);

        let task = tokio::spawn(async move {
            let mut changes = local.watch();
            changes.mark_unchanged();

            match strategy {
                FetchStrategy::Cached => {
                    if !emit_active(&tx, local.as_ref()).await {
                        return;
                    }
                }
                FetchStrategy::Fast => {
                    if !emit_active(&tx, local.as_ref()).await {
                        return;
                    }
                    if connectivity.is_online() {
                        match remote.list().await {
                            Ok(entities) => {
                                // The cache merge bumps the watch; the loop
                                // below re-emits the refreshed set
                                if let Err(error) = local.replace_synced(&entities) {
                                    tracing::warn!(kind = %E::KIND, %error, "cache refresh failed");
                                }
                            }
                            Err(error) => {
                                tracing::debug!(kind = %E::KIND, %error, "background refresh failed");
                            }
                        }
                    }
                }
                FetchStrategy::Fresh | FetchStrategy::Synced => {
                    if connectivity.is_online() {
                        match remote.list().await {
                            Ok(entities) => match local.replace_synced(&entities) {
                                Ok(()) => {
                                    changes.mark_unchanged();
                                    if !emit_active(&tx, local.as_ref()).await {
                                        return;
                                    }
                                }
                                Err(error) => {
                                    if tx.send(Err(error)).await.is_err() {
                                        return;
                                    }
                                }
                            },
                            Err(error) => {
                                if tx.send(Err(error)).await.is_err() {
                                    return;
                                }
                            }
                        }
                    } else if tx.send(Err(Error::offline())).await.is_err() {
                        return;
                    }
                }
                FetchStrategy::Fallback => {
                    if connectivity.is_online() {
                        match remote.list().await {
                            Ok(entities) => {
                                if let Err(error) = local.replace_synced(&entities) {
                                    tracing::warn!(kind = %E::KIND, %error, "cache refresh failed");
                                }
                                changes.mark_unchanged();
                            }
                            Err(error) => {
                                tracing::debug!(kind = %E::KIND, %error, "remote list failed; falling back to cache");
                            }
                        }
                    }
                    if !emit_active(&tx, local.as_ref()).await {
                        return;
                    }
                }
            }

            loop {
                if changes.changed().await.is_err() {
                    break;
                }
                changes.mark_unchanged();
                if !emit_active(&tx, local.as_ref()).await {
                    break;
                }
            }
        });

        Subscription { items: rx, task }
    }

    fn local_get(&self, id: &str) -> Result<E> {
        self.local
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Cache a remote read as `Synced`, unless the row has unconfirmed local
    /// work — pending rows are the source of truth until reconciled.
    fn cache_remote(&self, entity: &E) -> Result<()> {
        if let Some(stored) = self.local.get_any(&entity.id())? {
            if stored.state.is_pending() {
                return Ok(());
            }
        }
        self.local.upsert(entity, SyncState::Synced)
    }

    fn spawn_document_refresh(&self, id: &str) {
        let repository = self.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            match repository.remote.fetch(&id).await {
                Ok(Some(entity)) => {
                    if let Err(error) = repository.cache_remote(&entity) {
                        tracing::warn!(kind = %E::KIND, id, %error, "cache refresh failed");
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::debug!(kind = %E::KIND, id, %error, "background refresh failed");
                }
            }
        });
    }

    fn spawn_collection_refresh(&self) {
        let repository = self.clone();
        tokio::spawn(async move {
            match repository.remote.list().await {
                Ok(entities) => {
                    if let Err(error) = repository.local.replace_synced(&entities) {
                        tracing::warn!(kind = %E::KIND, %error, "cache refresh failed");
                    }
                }
                Err(error) => {
                    tracing::debug!(kind = %E::KIND, %error, "background refresh failed");
                }
            }
        });
    }
}

async fn emit_active<E: Entity>(
    tx: &mpsc::Sender<Result<Vec<E>>>,
    local: &dyn LocalStore<E>,
) -> bool {
    tx.send(local.list_active()).await.is_ok()
}

/// A cancellable `observe` stream.
///
/// Dropping the subscription aborts the observer task and releases its
/// local-store watch registration.
pub struct Subscription<E> {
    items: mpsc::Receiver<Result<Vec<E>>>,
    task: JoinHandle<()>,
}

impl<E> Subscription<E> {
    /// Wait for the next emission; `None` once the stream is closed
    pub async fn next(&mut self) -> Option<Result<Vec<E>>> {
        self.items.recv().await
    }

    /// Stop observing. The stream ends after any already-buffered items;
    /// nothing new is emitted once this returns.
    pub fn cancel(&mut self) {
        self.task.abort();
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityMonitor;
    use crate::models::Note;
    use crate::store::{SqliteBackend, SqliteNoteStore};
    use crate::testing::MockRemoteStore;
    use pretty_assertions::assert_eq;

    struct Fixture {
        repository: SyncRepository<Note>,
        store: Arc<SqliteNoteStore>,
        remote: Arc<MockRemoteStore<Note>>,
        connectivity: ConnectivityMonitor,
    }

    fn fixture(online: bool) -> Fixture {
        let store = Arc::new(SqliteNoteStore::new(SqliteBackend::open_in_memory().unwrap()));
        let remote = Arc::new(MockRemoteStore::new());
        let connectivity = ConnectivityMonitor::new(online);
        let repository = SyncRepository::new(
            Arc::clone(&store) as Arc<dyn LocalStore<Note>>,
            Arc::clone(&remote) as Arc<dyn RemoteStore<Note>>,
            Arc::new(connectivity.clone()),
        );
        Fixture {
            repository,
            store,
            remote,
            connectivity,
        }
    }

    #[test]
    fn create_marks_record_pending() {
        let f = fixture(true);
        let note = f.repository.create(Note::new("Groceries", "milk", None)).unwrap();

        let stored = f.store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Pending);
        assert_eq!(f.remote.total_calls(), 0);
    }

    #[test]
    fn create_blank_title_touches_nothing() {
        let f = fixture(true);
        let result = f.repository.create(Note::new("   ", "body", None));

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(f.store.list_active().unwrap().is_empty());
        assert_eq!(f.remote.total_calls(), 0);
    }

    #[test]
    fn update_preserves_created_at_and_repends() {
        let f = fixture(true);
        let note = f.repository.create(Note::new("Title", "v1", None)).unwrap();
        f.store.set_state(&note.id.as_str(), SyncState::Synced).unwrap();

        let mut edited = note.clone();
        edited.content = "v2".to_string();
        edited.created_at = 0; // caller tampering must not stick
        let updated = f.repository.update(edited).unwrap();

        assert_eq!(updated.created_at, note.created_at);
        let stored = f.store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Pending);
        assert_eq!(stored.entity.content, "v2");
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let f = fixture(true);
        let result = f.repository.update(Note::new("Title", "", None));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn delete_never_synced_record_is_immediate() {
        let f = fixture(true);
        let note = f.repository.create(Note::new("Draft", "", None)).unwrap();

        f.repository.delete(&note.id.as_str()).unwrap();

        assert!(f.store.get_any(&note.id.as_str()).unwrap().is_none());
    }

    #[test]
    fn delete_synced_record_tombstones() {
        let f = fixture(true);
        let note = Note::new("Synced", "", None);
        f.store.upsert(&note, SyncState::Synced).unwrap();

        f.repository.delete(&note.id.as_str()).unwrap();

        let stored = f.store.get_any(&note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::PendingDelete);
    }

    #[test]
    fn delete_blank_id_is_validation_error() {
        let f = fixture(true);
        assert!(matches!(
            f.repository.delete("  "),
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn observe_cached_never_touches_remote() {
        let f = fixture(true);
        f.repository.create(Note::new("First", "", None)).unwrap();

        let mut sub = f.repository.observe(FetchStrategy::Cached);
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        // Connectivity churn and further writes must not reach the remote
        f.connectivity.set_online(false);
        f.connectivity.set_online(true);
        f.repository.create(Note::new("Second", "", None)).unwrap();

        let second = sub.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(f.remote.total_calls(), 0);
    }

    #[tokio::test]
    async fn observe_cancel_stops_emissions() {
        let f = fixture(true);
        f.repository.create(Note::new("First", "", None)).unwrap();

        let mut sub = f.repository.observe(FetchStrategy::Cached);
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        // A write after cancellation must not reach the dead stream
        sub.cancel();
        f.repository.create(Note::new("Second", "", None)).unwrap();

        assert!(sub.next().await.is_none());
        assert_eq!(f.remote.total_calls(), 0);
    }

    #[tokio::test]
    async fn observe_drop_releases_watch_registration() {
        let f = fixture(true);
        f.repository.create(Note::new("First", "", None)).unwrap();

        let mut kept = f.repository.observe(FetchStrategy::Cached);
        assert_eq!(kept.next().await.unwrap().unwrap().len(), 1);

        {
            let mut dropped = f.repository.observe(FetchStrategy::Cached);
            assert_eq!(dropped.next().await.unwrap().unwrap().len(), 1);
        }

        // The surviving subscription still sees later writes
        f.repository.create(Note::new("Second", "", None)).unwrap();
        let second = kept.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn observe_fresh_offline_errors_and_leaves_cache_alone() {
        let f = fixture(false);
        let note = Note::new("Cached", "", None);
        f.store.upsert(&note, SyncState::Synced).unwrap();
        let before = f.store.list_active().unwrap();

        let mut sub = f.repository.observe(FetchStrategy::Fresh);
        let first = sub.next().await.unwrap();
        assert!(matches!(first, Err(Error::Remote(_))));

        assert_eq!(f.store.list_active().unwrap(), before);
        assert_eq!(f.remote.total_calls(), 0);
    }

    #[tokio::test]
    async fn observe_fresh_online_refreshes_cache_first() {
        let f = fixture(true);
        let remote_note = Note::new("From remote", "", None);
        f.remote.seed(vec![remote_note.clone()]);

        let mut sub = f.repository.observe(FetchStrategy::Fresh);
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, remote_note.id);

        let stored = f.store.get_any(&remote_note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Synced);
    }

    #[tokio::test]
    async fn observe_fast_emits_local_then_refreshed() {
        let f = fixture(true);
        let remote_note = Note::new("Remote only", "", None);
        f.remote.seed(vec![remote_note.clone()]);

        let mut sub = f.repository.observe(FetchStrategy::Fast);
        let first = sub.next().await.unwrap().unwrap();
        assert!(first.is_empty());

        // Second emission arrives once the background refresh lands
        let second = sub.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, remote_note.id);
    }

    #[tokio::test]
    async fn observe_fallback_masks_remote_failure() {
        let f = fixture(true);
        f.remote.fail_lists(true);
        let note = Note::new("Local", "", None);
        f.store.upsert(&note, SyncState::Synced).unwrap();

        let mut sub = f.repository.observe(FetchStrategy::Fallback);
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, note.id);
    }

    #[tokio::test]
    async fn get_by_id_strategies() {
        let f = fixture(false);
        let local_note = Note::new("Local", "", None);
        f.store.upsert(&local_note, SyncState::Synced).unwrap();

        // Cached hit and miss
        let found = f
            .repository
            .get_by_id(&local_note.id.as_str(), FetchStrategy::Cached)
            .await
            .unwrap();
        assert_eq!(found.id, local_note.id);
        let missing = f
            .repository
            .get_by_id("0191d3a0-0000-7000-8000-000000000000", FetchStrategy::Cached)
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));

        // Fresh offline propagates the remote error
        let offline = f
            .repository
            .get_by_id(&local_note.id.as_str(), FetchStrategy::Fresh)
            .await;
        assert!(matches!(offline, Err(Error::Remote(_))));

        // Fallback offline serves the cache
        let fallback = f
            .repository
            .get_by_id(&local_note.id.as_str(), FetchStrategy::Fallback)
            .await
            .unwrap();
        assert_eq!(fallback.id, local_note.id);
    }

    #[tokio::test]
    async fn list_fresh_merges_remote_into_cache() {
        let f = fixture(true);
        let remote_note = Note::new("Remote", "", None);
        f.remote.seed(vec![remote_note.clone()]);

        let listed = f.repository.list(FetchStrategy::Fresh).await.unwrap();
        assert_eq!(listed.len(), 1);

        let stored = f.store.get_any(&remote_note.id.as_str()).unwrap().unwrap();
        assert_eq!(stored.state, SyncState::Synced);
        assert!(stored.synced_once);
    }

    #[tokio::test]
    async fn refresh_requires_connectivity() {
        let f = fixture(false);
        assert!(matches!(
            f.repository.refresh().await,
            Err(Error::Remote(_))
        ));

        f.connectivity.set_online(true);
        f.repository.refresh().await.unwrap();
        assert_eq!(f.remote.total_calls(), 1);
    }

    #[tokio::test]
    async fn pending_count_tracks_unconfirmed_rows() {
        let f = fixture(true);
        let _pending = f.repository.create(Note::new("Pending", "", None)).unwrap();
        let doomed = Note::new("Doomed", "", None);
        f.store.upsert(&doomed, SyncState::Synced).unwrap();
        f.repository.delete(&doomed.id.as_str()).unwrap();

        assert_eq!(f.repository.pending_count().unwrap(), 2);
    }
}
