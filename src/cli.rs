use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::commands::migrate::{self, MigrateOptions};

/// Import Obsidian journal notes into the Supabase `entries` table.
///
/// Store credentials come from SUPABASE_URL and SUPABASE_KEY (environment,
/// `.env`, or the config file); the vault defaults to OBSIDIAN_VAULT_PATH.
#[derive(Debug, Parser)]
#[command(name = "journal-migrate", version, about)]
pub struct Cli {
    /// Vault root to scan, overriding OBSIDIAN_VAULT_PATH.
    #[arg(long, value_name = "PATH")]
    pub vault: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    migrate::run(&MigrateOptions { vault: cli.vault })?;
    Ok(())
}
