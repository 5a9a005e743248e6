//! notes: command-line front-end for the local notes collection.
//!
//! Loads the collection from a JSON file, runs one command, and waits for
//! every save to land before exiting.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use notes_cli::commands;
use notes_cli::{Config, JsonFileStore};
use notes_core::{LoadOutcome, NoteCollection};

#[derive(Parser, Debug)]
#[command(name = "notes")]
#[command(about = "Create, search, export and import local notes")]
struct Args {
    /// Directory holding notes.json
    #[arg(long, env = "NOTES_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List notes grouped by year, newest first
    List {
        /// Only show notes containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// Print the grouped view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a note's content
    Show {
        /// Note id or unique id prefix
        id: String,
    },
    /// Create a note
    Add {
        /// Initial content ("-" reads stdin)
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Replace a note's content
    Edit {
        /// Note id or unique id prefix
        id: String,

        /// New content ("-" reads stdin)
        #[arg(short, long)]
        content: String,
    },
    /// Delete a note
    Delete {
        /// Note id or unique id prefix
        id: String,
    },
    /// Write every note to a backup file
    Export {
        /// Destination file (defaults to Notes_backup_<date>.json)
        path: Option<PathBuf>,
    },
    /// Merge notes from a backup file, skipping ids that already exist
    Import {
        /// Backup file to read
        path: PathBuf,
    },
}

fn read_content(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read content from stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,notes_cli=debug,notes_core=debug"
    } else {
        "info,notes_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(args.data_dir)?;
    info!("Notes file: {}", config.notes_file().display());

    let store = JsonFileStore::new(config.notes_file());
    let mut collection = NoteCollection::new(store);
    if let LoadOutcome::Recovered(e) = collection.load().await {
        warn!("Starting with an empty collection: {}", e);
    }

    let mut stdout = std::io::stdout().lock();
    let result = match args.command {
        Command::List { search, json } => {
            commands::list(&mut collection, search.as_deref(), json, &mut stdout)
        }
        Command::Show { id } => commands::show(&collection, &id, &mut stdout),
        Command::Add { content } => {
            let content = content.as_deref().map(read_content).transpose()?;
            commands::add(&mut collection, content.as_deref(), &mut stdout).await
        }
        Command::Edit { id, content } => {
            let content = read_content(&content)?;
            commands::edit(&mut collection, &id, &content, &mut stdout).await
        }
        Command::Delete { id } => commands::delete(&mut collection, &id, &mut stdout).await,
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| {
                PathBuf::from(Config::default_export_name(Local::now().date_naive()))
            });
            commands::export(&collection, &path.to_string_lossy(), &mut stdout).await
        }
        Command::Import { path } => {
            commands::import(&mut collection, &path.to_string_lossy(), &mut stdout).await
        }
    };

    // Let outstanding saves land even if the command failed
    collection.flush().await;
    result
}
