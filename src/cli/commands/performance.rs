use anyhow::Result;
use clap::Args;

use crate::portfolio::{display, PortfolioService};

#[derive(Args, Debug)]
pub struct PerformanceArgs {
    /// Asset to report on, e.g. ETH
    pub asset: String,

    /// Window length in days
    #[arg(long, default_value = "30")]
    pub days: i64,
}

pub async fn execute(service: &PortfolioService, args: PerformanceArgs) -> Result<()> {
    let report = service.asset_performance(&args.asset, args.days).await?;
    println!("{}", display::render_performance(&report));
    Ok(())
}
