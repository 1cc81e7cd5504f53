//! Category model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind};
use crate::error::{Error, Result};

/// A unique identifier for a category, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(Uuid);

impl CategoryId {
    /// Create a new unique category ID using UUID v7
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

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A category grouping notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,
    /// Display name; must not be blank
    pub name: String,
    /// Optional cover image URL
    pub image_url: Option<String>,
    /// Optional display color as `#RGB` or `#RRGGBB`
    pub color_hex: Option<String>,
    /// Sort position in listings (ascending)
    pub position: i64,
}

impl Category {
    /// Create a new category with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            image_url: None,
            color_hex: None,
            position: 0,
        }
    }

    /// Set the display color
    #[must_use]
    pub fn with_color(mut self, color_hex: impl Into<String>) -> Self {
        self.color_hex = Some(color_hex.into());
        self
    }

    /// Set the cover image URL
    #[must_use]
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Set the sort position
    #[must_use]
    pub const fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;
    const COLLECTION: &'static str = "categories";

    fn id(&self) -> String {
        self.id.as_str()
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(
                "category name cannot be empty".to_string(),
            ));
        }
        if let Some(color) = &self.color_hex {
            if !is_valid_color_hex(color) {
                return Err(Error::Validation(format!(
                    "invalid category color: {color}"
                )));
            }
        }
        Ok(())
    }

    fn carry_over(&mut self, _existing: &Self) {
        // Categories carry no immutable timestamps
    }
}

/// Check that a color looks like `#RGB` or `#RRGGBB`
fn is_valid_color_hex(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}
