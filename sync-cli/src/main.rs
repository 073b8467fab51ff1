//! # studysync
//!
//! Operator CLI for inspecting and repairing a user's quiz data.
//!
//! ## Commands
//!
//! - `init`: Write endpoint and user configuration
//! - `list`: List quizzes, optionally by status
//! - `show`: Print one quiz as JSON
//! - `status`: Show quiz counts and connection health
//! - `delete`: Delete one quiz and renumber the rest
//! - `delete-all`: Delete every quiz
//! - `dedupe`: Remove duplicate quizzes
//!
//! ## Example
//!
//! ```bash
//! # Point the CLI at a data service
//! studysync init --endpoint https://data.example.com/v1 --user learner-42
//!
//! # Inspect
//! studysync list --status completed
//! studysync show 3
//!
//! # Repair
//! studysync dedupe
//! studysync delete 3
//! ```
//!
//! Set `RUST_LOG=studysync_client=debug` to see retries, breaker
//! transitions and write fallbacks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::list::StatusFilter;
use commands::{dedupe, delete, init, list, status};

/// Operator CLI for studysync quiz data.
#[derive(Parser, Debug)]
#[command(name = "studysync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for configuration and local backups
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write endpoint and user configuration
    Init {
        /// Base URL of the data service
        #[arg(long)]
        endpoint: String,

        /// User whose quizzes to operate on
        #[arg(long, short)]
        user: String,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// List quizzes
    List {
        /// Only list quizzes with this status
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
    },

    /// Print one quiz as JSON
    Show {
        /// Quiz id or number
        quiz: String,
    },

    /// Show quiz counts and connection health
    Status,

    /// Delete one quiz and renumber the rest
    Delete {
        /// Quiz id or number
        quiz: String,
    },

    /// Delete every quiz
    DeleteAll {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Remove duplicate quizzes and renumber
    Dedupe,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    if let Commands::Init {
        endpoint,
        user,
        force,
    } = &cli.command
    {
        return init::run(&data_dir, endpoint, user, *force).await;
    }

    if let Commands::Status = cli.command {
        // Report health even when the remote is unreachable
        let (config, manager) = commands::connect(&data_dir).await?;
        manager.load().await;
        status::run(&config, &data_dir, &manager);
        return Ok(());
    }

    let (_, manager) = commands::open(&data_dir).await?;

    match cli.command {
        Commands::Init { .. } | Commands::Status => {}
        Commands::List { status } => {
            list::run(&manager, status);
        }
        Commands::Show { quiz } => {
            list::show(&manager, &quiz)?;
        }
        Commands::Delete { quiz } => {
            delete::run(&manager, &quiz).await?;
        }
        Commands::DeleteAll { yes } => {
            delete::all(&manager, yes).await?;
        }
        Commands::Dedupe => {
            dedupe::run(&manager).await?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default data directory for the CLI.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "studysync", "studysync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
