//! Data models for quill

mod category;
mod note;
mod sync_state;

pub use category::{Category, CategoryId};
pub use note::{Note, NoteId};
pub use sync_state::SyncState;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// The aggregate types the sync engine reconciles independently.
///
/// Each kind has its own local table, remote collection, and sync worker;
/// there is no shared mutable state between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Note,
    Category,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common surface the repositories and sync workers need from an aggregate.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Reconciliation lane this aggregate belongs to
    const KIND: EntityKind;
    /// Remote collection name
    const COLLECTION: &'static str;

    /// String form of the record id
    fn id(&self) -> String;

    /// Reject records with blank required fields
    fn validate(&self) -> Result<()>;

    /// Carry immutable fields over from the stored row when updating
    /// (e.g. a note keeps its original `created_at`)
    fn carry_over(&mut self, existing: &Self);
}
