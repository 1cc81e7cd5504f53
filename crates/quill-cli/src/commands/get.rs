use std::path::Path;

use quill_core::FetchStrategy;

use crate::commands::common::{note_to_list_item, open_context, parse_note_id};
use crate::error::CliError;

pub async fn run_get(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let ctx = open_context(db_path)?;

    // Serve the cache; fall back to remote only for rows we never pulled
    let strategy = if ctx.sync_configured {
        FetchStrategy::Fallback
    } else {
        FetchStrategy::Cached
    };
    let note = ctx.notes.get_by_id(&note_id.as_str(), strategy).await?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&note_to_list_item(&note))?
        );
        return Ok(());
    }

    println!("{}", note.title);
    if let Some(category_id) = note.category_id {
        println!("category: {category_id}");
    }
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
    Ok(())
}
