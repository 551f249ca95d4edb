//! Banking CLI - card accounts from an interactive menu
//!
//! Usage:
//! ```bash
//! banking --file-name card.s3db
//! banking --file-name card.s3db --verbose
//! ```

use anyhow::{Context, Result};
use banking_core::utils::SqliteStorage;
use banking_core::Ledger;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

mod shell;

use shell::Shell;

/// Simple banking system backed by SQLite
#[derive(Parser)]
#[command(name = "banking")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long = "file-name", alias = "fileName")]
    pub file_name: PathBuf,

    /// Log diagnostics to stderr at debug level
    #[arg(long, short)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the menu
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let storage = SqliteStorage::open(&cli.file_name)
        .await
        .with_context(|| format!("failed to open {}", cli.file_name.display()))?;

    let mut ledger = Ledger::open(storage.clone())
        .await
        .context("failed to initialize the banking system")?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Shell::new(&mut ledger, stdin.lock(), stdout.lock())
        .run()
        .await?;

    storage.close().await;
    Ok(())
}
