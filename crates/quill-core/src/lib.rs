//! quill-core - Offline-first sync engine for notes and categories
//!
//! Keeps a local sqlite store and a remote document store eventually
//! consistent per entity collection. Local writes land immediately and are
//! tagged `PENDING`/`PENDING_DELETE`; a sync worker drains the pending set
//! against the remote store whenever the scheduler triggers a pass. Reads go
//! through a [`FetchStrategy`] that decides local/remote precedence.

pub mod auth;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod models;
pub mod remote;
pub mod repository;
pub mod scheduler;
pub mod store;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use models::{Category, CategoryId, Entity, EntityKind, Note, NoteId, SyncState};
pub use repository::{FetchStrategy, Subscription, SyncRepository};
