use std::path::Path;

use crate::commands::common::{open_context, parse_note_id};
use crate::error::CliError;

pub fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let ctx = open_context(db_path)?;

    ctx.notes.delete(&note_id.as_str())?;
    println!("{note_id}");
    Ok(())
}
