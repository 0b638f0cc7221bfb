use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::warn;

use crate::portfolio::PortfolioService;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Legacy trade-history JSON file to replay
    pub path: PathBuf,

    /// Confirm the migration (clears the ledger and derived state first)
    #[arg(long)]
    pub yes: bool,
}

pub async fn execute(service: &PortfolioService, args: MigrateArgs) -> Result<()> {
    if !args.yes {
        warn!("⚠️  Migration clears the ledger and all derived state. Re-run with --yes to confirm.");
        return Ok(());
    }

    let (migrated, skipped) = service.migrate_legacy(&args.path).await?;
    println!(
        "{}",
        format!("✅ Migrated {} trades ({} skipped)", migrated, skipped).bright_green()
    );
    Ok(())
}
