use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Offline-first notes with background sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: String,
        /// Note body
        content: Vec<String>,
        /// Category id to file the note under
        #[arg(long, value_name = "ID")]
        category: Option<String>,
    },
    /// List notes
    List {
        /// Pull the remote collection into the cache before listing
        #[arg(long)]
        pull: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single note
    Get {
        /// Note id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing note
    Edit {
        /// Note id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body
        #[arg(long)]
        content: Option<String>,
        /// New category id; pass an empty string to clear
        #[arg(long, value_name = "ID")]
        category: Option<String>,
    },
    /// Delete a note
    Delete {
        /// Note id
        id: String,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Show local database and sync status
    Status,
    /// Push pending local changes to the remote store
    Sync,
    /// Replace the local cache with the remote collections
    Refresh,
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a new category
    #[command(alias = "new")]
    Add {
        /// Category name
        name: String,
        /// Display color as #RGB or #RRGGBB
        #[arg(long, value_name = "HEX")]
        color: Option<String>,
        /// Sort position in listings
        #[arg(long, default_value = "0")]
        position: i64,
    },
    /// List categories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a category
    Delete {
        /// Category id
        id: String,
    },
}
