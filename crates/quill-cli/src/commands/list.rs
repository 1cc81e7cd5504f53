use std::path::Path;

use quill_core::FetchStrategy;

use crate::commands::common::{format_note_lines, note_to_list_item, open_context, NoteListItem};
use crate::error::CliError;

pub async fn run_list(pull: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let ctx = open_context(db_path)?;

    if pull {
        if !ctx.sync_configured {
            return Err(CliError::SyncNotConfigured);
        }
        ctx.notes.refresh().await?;
    }

    let notes = ctx.notes.list(FetchStrategy::Cached).await?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes.");
        return Ok(());
    }

    for line in format_note_lines(&notes) {
        println!("{line}");
    }
    Ok(())
}
