//! Note model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CategoryId, Entity, EntityKind};
use crate::error::{Error, Result};

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier, assigned locally on create and kept for life
    pub id: NoteId,
    /// Title shown in listings; must not be blank
    pub title: String,
    /// Body text
    pub content: String,
    /// Owning category, if any
    pub category_id: Option<CategoryId>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Create a new note with the given title and content
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category_id: Option<CategoryId>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: NoteId::new(),
            title: title.into(),
            content: content.into(),
            category_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get the title truncated to `max_len` characters, for listings
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        self.title.chars().take(max_len).collect()
    }

    /// Bump `updated_at` to now
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl Entity for Note {
    const KIND: EntityKind = EntityKind::Note;
    const COLLECTION: &'static str = "notes";

    fn id(&self) -> String {
        self.id.as_str()
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("note title cannot be empty".to_string()));
        }
        Ok(())
    }

    fn carry_over(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
        self.touch();
    }
}
