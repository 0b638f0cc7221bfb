use anyhow::Result;
use clap::Args;

use crate::portfolio::{display, PortfolioService};

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    /// Print the raw JSON report instead of tables
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(service: &PortfolioService, args: AnalyticsArgs) -> Result<()> {
    let report = service.get_analytics().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", display::render_analytics(&report));
    }
    Ok(())
}
