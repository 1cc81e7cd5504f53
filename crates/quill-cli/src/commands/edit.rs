use std::path::Path;

use quill_core::{CategoryId, FetchStrategy};

use crate::commands::common::{open_context, parse_note_id};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    title: Option<&str>,
    content: Option<&str>,
    category: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let ctx = open_context(db_path)?;

    let mut note = ctx
        .notes
        .get_by_id(&note_id.as_str(), FetchStrategy::Cached)
        .await?;

    if let Some(title) = title {
        let title = title.trim();
        if title.is_empty() {
            return Err(CliError::EmptyTitle);
        }
        note.title = title.to_string();
    }
    if let Some(content) = content {
        note.content = content.to_string();
    }
    if let Some(category) = category {
        let trimmed = category.trim();
        note.category_id = if trimmed.is_empty() {
            None
        } else {
            Some(
                trimmed
                    .parse::<CategoryId>()
                    .map_err(|_| CliError::InvalidId(category.to_string()))?,
            )
        };
    }

    let updated = ctx.notes.update(note)?;
    println!("{}", updated.id);
    Ok(())
}
