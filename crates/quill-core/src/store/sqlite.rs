//! SQLite implementation of the local store

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::watch;

use super::{LocalStore, Stored};
use crate::error::{Error, Result};
use crate::models::{Category, Entity, Note, SyncState};

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Shared `SQLite` connection with migrations applied.
///
/// Both entity stores borrow the same backend; each row operation takes the
/// connection lock for the duration of a single statement or transaction.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open a database at the given path, creating it if it doesn't exist.
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| Error::LocalStore(error.to_string()))?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run all pending migrations
fn migrate(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;
    if version < 1 {
        migrate_v1(conn)?;
    }
    debug_assert!(version <= CURRENT_VERSION);
    Ok(())
}

/// Get the current schema version
fn schema_version(conn: &Connection) -> Result<i32> {
    let exists: i32 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Ok(0);
    }
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration to version 1: initial schema
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY
         );
         CREATE TABLE IF NOT EXISTS notes (
             id TEXT PRIMARY KEY,
             title TEXT NOT NULL,
             content TEXT NOT NULL,
             category_id TEXT,
             created_at INTEGER NOT NULL,
             updated_at INTEGER NOT NULL,
             sync_state TEXT NOT NULL DEFAULT 'PENDING',
             synced_once INTEGER NOT NULL DEFAULT 0
         );
         CREATE INDEX IF NOT EXISTS idx_notes_updated ON notes(updated_at DESC);
         CREATE INDEX IF NOT EXISTS idx_notes_sync_state ON notes(sync_state);
         CREATE TABLE IF NOT EXISTS categories (
             id TEXT PRIMARY KEY,
             name TEXT NOT NULL,
             image_url TEXT,
             color_hex TEXT,
             position INTEGER NOT NULL DEFAULT 0,
             sync_state TEXT NOT NULL DEFAULT 'PENDING',
             synced_once INTEGER NOT NULL DEFAULT 0
         );
         CREATE INDEX IF NOT EXISTS idx_categories_position ON categories(position);
         CREATE INDEX IF NOT EXISTS idx_categories_sync_state ON categories(sync_state);
         INSERT INTO schema_version (version) VALUES (1);
         COMMIT;",
    )?;
    Ok(())
}

fn parse_state(tag: &str) -> Result<SyncState> {
    tag.parse()
}

/// A stored id that no longer parses is corruption, not a fresh identity
fn bad_id(column: usize, error: uuid::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(error))
}

/// `SQLite` implementation of `LocalStore<Note>`
pub struct SqliteNoteStore {
    backend: SqliteBackend,
    notify: Arc<watch::Sender<u64>>,
}

impl SqliteNoteStore {
    #[must_use]
    pub fn new(backend: SqliteBackend) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            backend,
            notify: Arc::new(notify),
        }
    }

    fn bump(&self) {
        self.notify.send_modify(|version| *version += 1);
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let id: String = row.get(0)?;
        let category_id: Option<String> = row.get(3)?;
        Ok(Note {
            id: id.parse().map_err(|error| bad_id(0, error))?,
            title: row.get(1)?,
            content: row.get(2)?,
            category_id: category_id.and_then(|raw| raw.parse().ok()),
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

const NOTE_COLUMNS: &str = "id, title, content, category_id, created_at, updated_at";

impl LocalStore<Note> for SqliteNoteStore {
    fn list_active(&self) -> Result<Vec<Note>> {
        let conn = self.backend.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, content, category_id, created_at, updated_at
             FROM notes
             WHERE sync_state != 'PENDING_DELETE'
             ORDER BY updated_at DESC",
        )?;
        let notes = stmt
            .query_map([], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn get(&self, id: &str) -> Result<Option<Note>> {
        let conn = self.backend.lock();
        let note = conn
            .query_row(
                "SELECT id, title, content, category_id, created_at, updated_at
                 FROM notes
                 WHERE id = ? AND sync_state != 'PENDING_DELETE'",
                params![id],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn get_any(&self, id: &str) -> Result<Option<Stored<Note>>> {
        let conn = self.backend.lock();
        let row = conn
            .query_row(
                "SELECT id, title, content, category_id, created_at, updated_at,
                        sync_state, synced_once
                 FROM notes WHERE id = ?",
                params![id],
                |row| {
                    let note = Self::parse_note(row)?;
                    let state: String = row.get(6)?;
                    let synced_once: i32 = row.get(7)?;
                    Ok((note, state, synced_once != 0))
                },
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((entity, state, synced_once)) => Ok(Some(Stored {
                entity,
                state: parse_state(&state)?,
                synced_once,
            })),
        }
    }

    fn upsert(&self, entity: &Note, state: SyncState) -> Result<()> {
        {
            let conn = self.backend.lock();
            conn.execute(
                "INSERT INTO notes (id, title, content, category_id, created_at, updated_at,
                                    sync_state, synced_once)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     content = excluded.content,
                     category_id = excluded.category_id,
                     created_at = excluded.created_at,
                     updated_at = excluded.updated_at,
                     sync_state = excluded.sync_state,
                     synced_once = MAX(notes.synced_once, excluded.synced_once)",
                params![
                    entity.id.as_str(),
                    entity.title,
                    entity.content,
                    entity.category_id.map(|id| id.as_str()),
                    entity.created_at,
                    entity.updated_at,
                    state.as_str(),
                    i32::from(state == SyncState::Synced),
                ],
            )?;
        }
        self.bump();
        Ok(())
    }

    fn set_state(&self, id: &str, state: SyncState) -> Result<()> {
        let rows = {
            let conn = self.backend.lock();
            conn.execute(
                "UPDATE notes SET sync_state = ?, synced_once = MAX(synced_once, ?) WHERE id = ?",
                params![state.as_str(), i32::from(state == SyncState::Synced), id],
            )?
        };
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        self.bump();
        Ok(())
    }

    fn soft_delete(&self, id: &str) -> Result<()> {
        self.set_state(id, SyncState::PendingDelete)
    }

    fn hard_delete(&self, id: &str) -> Result<()> {
        let rows = {
            let conn = self.backend.lock();
            conn.execute("DELETE FROM notes WHERE id = ?", params![id])?
        };
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        self.bump();
        Ok(())
    }

    fn list_where(&self, state: SyncState) -> Result<Vec<Note>> {
        let conn = self.backend.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, content, category_id, created_at, updated_at
             FROM notes
             WHERE sync_state = ?
             ORDER BY updated_at ASC",
        )?;
        let notes = stmt
            .query_map(params![state.as_str()], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn replace_synced(&self, entities: &[Note]) -> Result<()> {
        {
            let mut conn = self.backend.lock();
            let tx = conn.transaction()?;
            let incoming: HashSet<String> = entities.iter().map(Entity::id).collect();

            let stale: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM notes WHERE sync_state = 'SYNCED'")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                ids
            };
            for id in stale {
                if !incoming.contains(&id) {
                    tx.execute("DELETE FROM notes WHERE id = ?", params![id])?;
                }
            }

            for entity in entities {
                let state: Option<String> = tx
                    .query_row(
                        "SELECT sync_state FROM notes WHERE id = ?",
                        params![entity.id.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(tag) = state {
                    if parse_state(&tag)?.is_pending() {
                        continue;
                    }
                }
                tx.execute(
                    &format!(
                        "INSERT OR REPLACE INTO notes ({NOTE_COLUMNS}, sync_state, synced_once)
                         VALUES (?, ?, ?, ?, ?, ?, 'SYNCED', 1)"
                    ),
                    params![
                        entity.id.as_str(),
                        entity.title,
                        entity.content,
                        entity.category_id.map(|id| id.as_str()),
                        entity.created_at,
                        entity.updated_at,
                    ],
                )?;
            }
            tx.commit()?;
        }
        self.bump();
        Ok(())
    }

    fn watch(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }
}

/// `SQLite` implementation of `LocalStore<Category>`
pub struct SqliteCategoryStore {
    backend: SqliteBackend,
    notify: Arc<watch::Sender<u64>>,
}

impl SqliteCategoryStore {
    #[must_use]
    pub fn new(backend: SqliteBackend) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            backend,
            notify: Arc::new(notify),
        }
    }

    fn bump(&self) {
        self.notify.send_modify(|version| *version += 1);
    }

    /// Parse a category from a database row
    fn parse_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
        let id: String = row.get(0)?;
        Ok(Category {
            id: id.parse().map_err(|error| bad_id(0, error))?,
            name: row.get(1)?,
            image_url: row.get(2)?,
            color_hex: row.get(3)?,
            position: row.get(4)?,
        })
    }
}

const CATEGORY_COLUMNS: &str = "id, name, image_url, color_hex, position";

impl LocalStore<Category> for SqliteCategoryStore {
    fn list_active(&self) -> Result<Vec<Category>> {
        let conn = self.backend.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, image_url, color_hex, position
             FROM categories
             WHERE sync_state != 'PENDING_DELETE'
             ORDER BY position ASC, name ASC",
        )?;
        let categories = stmt
            .query_map([], Self::parse_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn get(&self, id: &str) -> Result<Option<Category>> {
        let conn = self.backend.lock();
        let category = conn
            .query_row(
                "SELECT id, name, image_url, color_hex, position
                 FROM categories
                 WHERE id = ? AND sync_state != 'PENDING_DELETE'",
                params![id],
                Self::parse_category,
            )
            .optional()?;
        Ok(category)
    }

    fn get_any(&self, id: &str) -> Result<Option<Stored<Category>>> {
        let conn = self.backend.lock();
        let row = conn
            .query_row(
                "SELECT id, name, image_url, color_hex, position, sync_state, synced_once
                 FROM categories WHERE id = ?",
                params![id],
                |row| {
                    let category = Self::parse_category(row)?;
                    let state: String = row.get(5)?;
                    let synced_once: i32 = row.get(6)?;
                    Ok((category, state, synced_once != 0))
                },
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((entity, state, synced_once)) => Ok(Some(Stored {
                entity,
                state: parse_state(&state)?,
                synced_once,
            })),
        }
    }

    fn upsert(&self, entity: &Category, state: SyncState) -> Result<()> {
        {
            let conn = self.backend.lock();
            conn.execute(
                "INSERT INTO categories (id, name, image_url, color_hex, position,
                                         sync_state, synced_once)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     image_url = excluded.image_url,
                     color_hex = excluded.color_hex,
                     position = excluded.position,
                     sync_state = excluded.sync_state,
                     synced_once = MAX(categories.synced_once, excluded.synced_once)",
                params![
                    entity.id.as_str(),
                    entity.name,
                    entity.image_url,
                    entity.color_hex,
                    entity.position,
                    state.as_str(),
                    i32::from(state == SyncState::Synced),
                ],
            )?;
        }
        self.bump();
        Ok(())
    }

    fn set_state(&self, id: &str, state: SyncState) -> Result<()> {
        let rows = {
            let conn = self.backend.lock();
            conn.execute(
                "UPDATE categories SET sync_state = ?, synced_once = MAX(synced_once, ?)
                 WHERE id = ?",
                params![state.as_str(), i32::from(state == SyncState::Synced), id],
            )?
        };
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        self.bump();
        Ok(())
    }

    fn soft_delete(&self, id: &str) -> Result<()> {
        self.set_state(id, SyncState::PendingDelete)
    }

    fn hard_delete(&self, id: &str) -> Result<()> {
        let rows = {
            let conn = self.backend.lock();
            conn.execute("DELETE FROM categories WHERE id = ?", params![id])?
        };
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        self.bump();
        Ok(())
    }

    fn list_where(&self, state: SyncState) -> Result<Vec<Category>> {
        let conn = self.backend.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, image_url, color_hex, position
             FROM categories
             WHERE sync_state = ?
             ORDER BY position ASC, name ASC",
        )?;
        let categories = stmt
            .query_map(params![state.as_str()], Self::parse_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn replace_synced(&self, entities: &[Category]) -> Result<()> {
        {
            let mut conn = self.backend.lock();
            let tx = conn.transaction()?;
            let incoming: HashSet<String> = entities.iter().map(Entity::id).collect();

            let stale: Vec<String> = {
                let mut stmt =
                    tx.prepare("SELECT id FROM categories WHERE sync_state = 'SYNCED'")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                ids
            };
            for id in stale {
                if !incoming.contains(&id) {
                    tx.execute("DELETE FROM categories WHERE id = ?", params![id])?;
                }
            }

            for entity in entities {
                let state: Option<String> = tx
                    .query_row(
                        "SELECT sync_state FROM categories WHERE id = ?",
                        params![entity.id.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(tag) = state {
                    if parse_state(&tag)?.is_pending() {
                        continue;
                    }
                }
                tx.execute(
                    &format!(
                        "INSERT OR REPLACE INTO categories ({CATEGORY_COLUMNS}, sync_state, synced_once)
                         VALUES (?, ?, ?, ?, ?, 'SYNCED', 1)"
                    ),
                    params![
                        entity.id.as_str(),
                        entity.name,
                        entity.image_url,
                        entity.color_hex,
                        entity.position,
                    ],
                )?;
            }
            tx.commit()?;
        }
        self.bump();
        Ok(())
    }

    fn watch(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }
}
