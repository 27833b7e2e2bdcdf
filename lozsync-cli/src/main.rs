//! Lozsync — Confluence status-lozenge → Google Sheets tracker CLI.
//!
//! # Usage
//!
//! ```text
//! lozsync auth
//! lozsync scan [--config lozsync.json]
//! lozsync run  [--config lozsync.json] [--append] [--dry-run]
//! ```

mod commands;
mod pipeline;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{auth::AuthArgs, run::RunArgs, scan::ScanArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "lozsync",
    version,
    about = "Sync Confluence status lozenges into a Google Sheets tracker",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// One-time Google OAuth bootstrap; saves the offline token.
    Auth(AuthArgs),

    /// Fetch and parse pages, print the lozenge breakdown. No writes.
    Scan(ScanArgs),

    /// Full pipeline: fetch, parse, reconcile spreadsheet tabs.
    Run(RunArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Auth(args) => args.run().await,
        Commands::Scan(args) => args.run().await,
        Commands::Run(args) => args.run().await,
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
