use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::portfolio::PortfolioService;

#[derive(Args, Debug)]
pub struct SyncArgs {}

pub async fn execute(service: &PortfolioService, _args: SyncArgs) -> Result<()> {
    println!("{}", "🔄 Reconciling with exchange balances...".bright_blue());

    let summary = service.reconcile_with_exchange().await?;
    println!(
        "{}",
        format!(
            "✅ Reconciled: {} updated, {} added, {} removed",
            summary.updated, summary.added, summary.removed
        )
        .bright_green()
    );
    Ok(())
}
