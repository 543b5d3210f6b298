mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use imgtext::config::{default_config_path, load_config, Config};
use imgtext::db::{item_repo, Database, ItemFilter, RecordStore};
use imgtext::{ItemStatus, UploadService, UploadedImage};

#[derive(Parser)]
#[command(name = "imgtext")]
#[command(about = "Extract text from images with local OCR and a remote vision model")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.imgtext/config.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process image files and print the batch result as JSON
    Process {
        /// Image files to upload
        files: Vec<PathBuf>,
    },
    /// Print one stored record as JSON
    Show {
        id: i64,
    },
    /// List stored records, newest first
    List {
        /// Only records with this status (pending, completed, failed)
        #[arg(short, long)]
        status: Option<ItemStatus>,

        /// Case-insensitive filename substring
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 50)]
        limit: u64,

        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;

    logging::init(&config.logging)?;

    match cli.command {
        Commands::Process { files } => process(&config, &files),
        Commands::Show { id } => show(&config, id),
        Commands::List {
            status,
            search,
            limit,
            offset,
        } => list(
            &config,
            ItemFilter {
                status,
                search,
                limit: Some(limit),
                offset: Some(offset),
            },
        ),
    }
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match default_config_path() {
        Some(path) if path.is_file() => load_config(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        _ => Ok(Config::default()),
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let path = config
        .database_path()
        .context("Could not determine a database path")?;
    Ok(Database::open(&path)?)
}

fn process(config: &Config, files: &[PathBuf]) -> Result<()> {
    let uploads = files
        .iter()
        .map(|path| {
            UploadedImage::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let service = UploadService::from_config(config)?;
    let response = service.process_uploads(uploads)?;

    info!(
        completed = response.completed_count(),
        failed = response.failed_count(),
        "Processing finished"
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn show(config: &Config, id: i64) -> Result<()> {
    let db = open_database(config)?;
    let Some(item) = db.get(id)? else {
        bail!("No record with id {}", id);
    };
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

fn list(config: &Config, filter: ItemFilter) -> Result<()> {
    let db = open_database(config)?;
    let (items, total) = item_repo::query(&db, &filter)?;

    for item in &items {
        println!("{}", item);
    }
    println!(
        "{} of {} record(s) (pending: {}, completed: {}, failed: {})",
        items.len(),
        total,
        item_repo::count_by_status(&db, ItemStatus::Pending)?,
        item_repo::count_by_status(&db, ItemStatus::Completed)?,
        item_repo::count_by_status(&db, ItemStatus::Failed)?,
    );
    Ok(())
}
