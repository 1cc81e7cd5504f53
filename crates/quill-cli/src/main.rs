//! Quill CLI - offline-first notes from the terminal
//!
//! Writes always land locally first; `quill sync` pushes pending changes to
//! the remote store when one is configured.

mod cli;
mod commands;
mod error;

use std::env;
use std::path::PathBuf;

use clap::Parser;

use crate::cli::{CategoryCommands, Cli, Commands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quill=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Add {
            title,
            content,
            category,
        } => commands::add::run_add(&title, &content, category.as_deref(), &db_path)?,
        Commands::List { pull, json } => commands::list::run_list(pull, json, &db_path).await?,
        Commands::Get { id, json } => commands::get::run_get(&id, json, &db_path).await?,
        Commands::Edit {
            id,
            title,
            content,
            category,
        } => {
            commands::edit::run_edit(
                &id,
                title.as_deref(),
                content.as_deref(),
                category.as_deref(),
                &db_path,
            )
            .await?;
        }
        Commands::Delete { id } => commands::delete::run_delete(&id, &db_path)?,
        Commands::Category { command } => match command {
            CategoryCommands::Add {
                name,
                color,
                position,
            } => commands::category::run_category_add(&name, color.as_deref(), position, &db_path)?,
            CategoryCommands::List { json } => {
                commands::category::run_category_list(json, &db_path).await?;
            }
            CategoryCommands::Delete { id } => {
                commands::category::run_category_delete(&id, &db_path)?;
            }
        },
        Commands::Status => commands::status::run_status(&db_path)?,
        Commands::Sync => commands::sync::run_sync(&db_path).await?,
        Commands::Refresh => commands::sync::run_refresh(&db_path).await?,
    }

    Ok(())
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("QUILL_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("quill.db")
}
