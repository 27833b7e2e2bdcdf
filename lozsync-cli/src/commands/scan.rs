//! `lozsync scan` — fetch and parse pages, print the breakdown.
//!
//! Read-only: never touches the destination spreadsheet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use lozsync_core::config;

use crate::pipeline;

/// Arguments for `lozsync scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the settings file.
    #[arg(long, default_value = "lozsync.json")]
    pub config: PathBuf,
}

impl ScanArgs {
    pub async fn run(self) -> Result<()> {
        let config = config::load(&self.config)
            .with_context(|| format!("configuration error ({})", self.config.display()))?;

        let collected = pipeline::collect_results(&config).await?;
        if collected.results.is_empty() {
            println!("No pages found matching the search criteria.");
            return Ok(());
        }
        if collected.excluded > 0 {
            println!(
                "{} excluded {} page(s) (templates, meta pages, generic)",
                "✓".green(),
                collected.excluded
            );
        }

        let total: u32 = collected.results.iter().map(|r| r.total_count).sum();
        println!(
            "{} found {} lozenge(s) across {} page(s)\n",
            "✓".green(),
            total,
            collected.results.len()
        );

        for result in &collected.results {
            println!(
                "  • {}: {} lozenge(s)",
                result.page_title.bold(),
                result.total_count
            );
            for lozenge in &result.lozenges {
                println!("    - {} ({}): {}", lozenge.text, lozenge.color, lozenge.count);
            }
        }

        Ok(())
    }
}
