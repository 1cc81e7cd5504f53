use std::path::Path;

use crate::commands::common::open_context;
use crate::error::CliError;

pub async fn run_sync(db_path: &Path) -> Result<(), CliError> {
    let ctx = open_context(db_path)?;
    if !ctx.sync_configured {
        return Err(CliError::SyncNotConfigured);
    }

    let before = ctx.notes.pending_count()? + ctx.categories.pending_count()?;

    // Categories first so note category references resolve remotely
    ctx.category_worker.run_pass().await?;
    ctx.note_worker.run_pass().await?;

    println!("Sync completed ({before} pending changes pushed)");
    Ok(())
}

pub async fn run_refresh(db_path: &Path) -> Result<(), CliError> {
    let ctx = open_context(db_path)?;
    if !ctx.sync_configured {
        return Err(CliError::SyncNotConfigured);
    }

    ctx.categories.refresh().await?;
    ctx.notes.refresh().await?;

    println!("Refresh completed");
    Ok(())
}
