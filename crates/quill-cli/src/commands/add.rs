use std::path::Path;

use quill_core::{CategoryId, Note};

use crate::commands::common::open_context;
use crate::error::CliError;

pub fn run_add(
    title: &str,
    content_parts: &[String],
    category: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CliError::EmptyTitle);
    }

    let category_id = category
        .map(|raw| {
            raw.trim()
                .parse::<CategoryId>()
                .map_err(|_| CliError::InvalidId(raw.to_string()))
        })
        .transpose()?;

    let ctx = open_context(db_path)?;
    let note = ctx
        .notes
        .create(Note::new(title, content_parts.join(" "), category_id))?;

    println!("{}", note.id);
    Ok(())
}
