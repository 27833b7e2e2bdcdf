//! `lozsync run` — the full reconciliation pipeline.
//!
//! Stage order: config → page ids → concurrent fetch → exclusion filter
//! → parse → delete excluded tabs → delete archived-page tabs → write
//! (or append) → sort tabs. Any stage failure aborts the run; there is
//! no partial retry.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use lozsync_core::config;
use lozsync_sheets::{token, SheetsClient, StoredToken, WriteOutcome};

use crate::pipeline;

/// Arguments for `lozsync run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the settings file.
    #[arg(long, default_value = "lozsync.json")]
    pub config: PathBuf,

    /// Append rows below existing content instead of replacing each
    /// tab's snapshot.
    #[arg(long)]
    pub append: bool,

    /// Show what would change without touching the spreadsheet.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub async fn run(self) -> Result<()> {
        let config = config::load(&self.config)
            .with_context(|| format!("configuration error ({})", self.config.display()))?;

        // Credential first: fail before any fetch when unauthenticated.
        let stored = token::load().context("failed to read saved token")?;
        let stored = match stored {
            Some(stored) => Some(refresh_if_expired(&config.sheets, stored).await?),
            None => None,
        };

        let mut sheets = SheetsClient::new(&config.sheets, stored.as_ref());
        if !sheets.is_authenticated() {
            anyhow::bail!("not authenticated with Google Sheets — run `lozsync auth` first");
        }

        let collected = pipeline::collect_results(&config).await?;
        if collected.results.is_empty() {
            println!("No pages found matching the search criteria — nothing to do.");
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
            "{} parsed {} lozenge(s) across {} page(s)",
            "✓".green(),
            total,
            collected.results.len()
        );

        let prefix = if self.dry_run { "[dry-run] " } else { "" };

        let excluded_tabs = sheets
            .delete_excluded_sheets(&config.exclusion_terms, self.dry_run)
            .await
            .context("failed to delete excluded tabs")?;
        println!(
            "{prefix}{} removed {} excluded tab(s)",
            "✓".green(),
            excluded_tabs.len()
        );

        let archived_tabs = sheets
            .delete_archived_page_sheets(&collected.results, self.dry_run)
            .await
            .context("failed to delete archived-page tabs")?;
        println!(
            "{prefix}{} removed {} archived-page tab(s)",
            "✓".green(),
            archived_tabs.len()
        );

        let outcomes = if self.append {
            sheets
                .append_results(&collected.results, self.dry_run)
                .await
                .context("failed to append results")?
        } else {
            sheets
                .write_results(&collected.results, self.dry_run)
                .await
                .context("failed to write results")?
        };
        print_outcomes(&outcomes);

        let sorted = sheets
            .sort_sheets_alphabetically(self.dry_run)
            .await
            .context("failed to sort tabs")?;
        println!("{prefix}{} sorted {} tab(s) alphabetically", "✓".green(), sorted);

        println!("\n{} complete", "✓".green().bold());
        Ok(())
    }
}

/// Refresh the access token when it is expired and a refresh token is
/// available; persist the fresh token for the next run.
async fn refresh_if_expired(
    sheets_config: &lozsync_core::config::SheetsConfig,
    stored: StoredToken,
) -> Result<StoredToken> {
    if !stored.is_expired(Utc::now()) {
        return Ok(stored);
    }

    println!("Access token expired — refreshing...");
    let client = reqwest::Client::new();
    let fresh = token::refresh(&client, sheets_config, &stored)
        .await
        .context("token refresh failed")?;
    token::save(&fresh).context("failed to save refreshed token")?;
    Ok(fresh)
}

fn print_outcomes(outcomes: &[WriteOutcome]) {
    for outcome in outcomes {
        match outcome {
            WriteOutcome::Written { tab, rows, .. } => {
                println!("  ✎  \"{tab}\" ({rows} row(s))");
            }
            WriteOutcome::WouldWrite { tab, rows, .. } => {
                println!("  ~  \"{tab}\" ({rows} row(s))");
            }
        }
    }
}
