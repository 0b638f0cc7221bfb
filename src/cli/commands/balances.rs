use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::warn;

use crate::config::QUOTE_CURRENCY;
use crate::portfolio::{display, PortfolioService};

#[derive(Args, Debug)]
pub struct BalancesArgs {
    /// Skip the live quote-currency balance lookup
    #[arg(long)]
    pub no_quote: bool,
}

pub async fn execute(service: &PortfolioService, args: BalancesArgs) -> Result<()> {
    let rows = service.get_balances().await?;
    println!("{}", display::balances_table(&rows));

    if !args.no_quote {
        // best-effort: a failing exchange must not fail the balances view
        match service.get_quote_balance().await {
            Ok(balance) => println!(
                "{}",
                format!("💰 {} free: {}", QUOTE_CURRENCY, balance).bright_green()
            ),
            Err(e) => warn!(error = %e, "Quote balance unavailable"),
        }
    }
    Ok(())
}
