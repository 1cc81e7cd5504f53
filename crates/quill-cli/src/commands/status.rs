use std::path::Path;

use crate::commands::common::open_context;
use crate::error::CliError;

pub fn run_status(db_path: &Path) -> Result<(), CliError> {
    let ctx = open_context(db_path)?;

    println!("database: {}", db_path.display());
    println!(
        "sync: {}",
        if ctx.sync_configured {
            "configured"
        } else {
            "not configured"
        }
    );
    println!("pending notes: {}", ctx.notes.pending_count()?);
    println!("pending categories: {}", ctx.categories.pending_count()?);
    Ok(())
}
