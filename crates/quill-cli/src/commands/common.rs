use std::path::Path;
use std::sync::Arc;

use quill_core::config::RemoteConfig;
use quill_core::connectivity::{Connectivity, ConnectivityMonitor};
use quill_core::remote::{HttpRemoteStore, RemoteStore, UnconfiguredRemote};
use quill_core::store::{LocalStore, SqliteBackend, SqliteCategoryStore, SqliteNoteStore};
use quill_core::worker::SyncWorker;
use quill_core::{Category, Note, NoteId, SyncRepository};
use serde::Serialize;

use crate::error::CliError;

/// Everything a command needs: repositories and workers over one local DB.
pub struct AppContext {
    pub notes: SyncRepository<Note>,
    pub categories: SyncRepository<Category>,
    pub note_worker: SyncWorker<Note>,
    pub category_worker: SyncWorker<Category>,
    pub sync_configured: bool,
}

/// Open the local database and wire repositories and workers.
///
/// Without `QUILL_REMOTE_URL` the context runs in local-only mode: reads and
/// writes work, sync commands report `SyncNotConfigured`.
pub fn open_context(db_path: &Path) -> Result<AppContext, CliError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let backend = SqliteBackend::open(db_path)?;
    let note_store: Arc<dyn LocalStore<Note>> = Arc::new(SqliteNoteStore::new(backend.clone()));
    let category_store: Arc<dyn LocalStore<Category>> =
        Arc::new(SqliteCategoryStore::new(backend));

    let remote_config = RemoteConfig::from_env()?;
    let sync_configured = remote_config.is_some();
    let (note_remote, category_remote): (Arc<dyn RemoteStore<Note>>, Arc<dyn RemoteStore<Category>>) =
        match &remote_config {
            Some(config) => {
                tracing::info!(endpoint = %config.endpoint, "sync enabled");
                (
                    Arc::new(HttpRemoteStore::<Note>::new(config)?),
                    Arc::new(HttpRemoteStore::<Category>::new(config)?),
                )
            }
            None => {
                tracing::info!("running in local-only mode (no remote config)");
                (Arc::new(UnconfiguredRemote), Arc::new(UnconfiguredRemote))
            }
        };

    // The CLI is invoked on demand; treat a configured remote as reachable
    // and let request failures surface per strategy.
    let connectivity: Arc<dyn Connectivity> =
        Arc::new(ConnectivityMonitor::new(sync_configured));

    Ok(AppContext {
        notes: SyncRepository::new(
            Arc::clone(&note_store),
            Arc::clone(&note_remote),
            Arc::clone(&connectivity),
        ),
        categories: SyncRepository::new(
            Arc::clone(&category_store),
            Arc::clone(&category_remote),
            connectivity,
        ),
        note_worker: SyncWorker::new(note_store, note_remote),
        category_worker: SyncWorker::new(category_store, category_remote),
        sync_configured,
    })
}

pub fn parse_note_id(raw: &str) -> Result<NoteId, CliError> {
    raw.trim()
        .parse()
        .map_err(|_| CliError::InvalidId(raw.to_string()))
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub updated_at_iso: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        category_id: note.category_id.map(|id| id.to_string()),
        created_at: note.created_at,
        updated_at: note.updated_at,
        updated_at_iso: iso_timestamp(note.updated_at),
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            format!(
                "{}  {}  {}",
                note.id,
                iso_timestamp(note.updated_at),
                note.title_preview(60)
            )
        })
        .collect()
}

fn iso_timestamp(unix_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(unix_ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_note_id_rejects_garbage() {
        assert!(parse_note_id("not-a-uuid").is_err());
        let id = NoteId::new();
        assert_eq!(parse_note_id(&id.as_str()).unwrap(), id);
    }

    #[test]
    fn note_list_item_carries_iso_timestamp() {
        let note = Note::new("Title", "body", None);
        let item = note_to_list_item(&note);
        assert_eq!(item.id, note.id.to_string());
        assert!(!item.updated_at_iso.is_empty());
    }
}
