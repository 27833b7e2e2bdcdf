//! `lozsync auth` — one-time Google OAuth bootstrap.
//!
//! Prints the consent URL, reads the authorization code from stdin,
//! exchanges it for an offline token, and saves the token for future
//! runs.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use lozsync_core::config;
use lozsync_sheets::token;

/// Arguments for `lozsync auth`.
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Re-run the consent flow even when a token is already saved.
    #[arg(long)]
    pub force: bool,
}

impl AuthArgs {
    pub async fn run(self) -> Result<()> {
        let sheets_config =
            config::sheets_config().context("Google OAuth environment is incomplete")?;

        if !self.force {
            if let Some(existing) = token::load().context("failed to read saved token")? {
                if !existing.is_expired(Utc::now()) {
                    println!("{} already authenticated", "✓".green());
                    println!("Re-run with --force to repeat the consent flow.");
                    return Ok(());
                }
            }
        }

        println!("Open this URL in your browser and grant access:\n");
        println!("{}\n", token::auth_url(&sheets_config));
        print!("Paste the authorization code here: ");
        io::stdout().flush().context("stdout flush failed")?;

        let mut code = String::new();
        io::stdin()
            .lock()
            .read_line(&mut code)
            .context("failed to read authorization code")?;
        let code = code.trim();
        if code.is_empty() {
            anyhow::bail!("no authorization code provided");
        }

        let client = reqwest::Client::new();
        let fresh = token::exchange_code(&client, &sheets_config, code)
            .await
            .context("authorization code exchange failed")?;
        token::save(&fresh).context("failed to save token")?;

        println!("{} authentication successful — token saved", "✓".green());
        Ok(())
    }
}
