use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::portfolio::{display, PortfolioService};

#[derive(Args, Debug)]
pub struct PositionsArgs {
    /// Print the raw JSON document instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(service: &PortfolioService, args: PositionsArgs) -> Result<()> {
    println!("{}", "📊 Fetching positions...".bright_blue());
    let positions = service.get_positions().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&positions)?);
    } else {
        println!("{}", display::positions_table(&positions));
    }
    Ok(())
}
