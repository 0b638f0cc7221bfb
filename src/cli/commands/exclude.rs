use anyhow::Result;
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;

use crate::portfolio::{display, PortfolioService};

#[derive(Args, Debug)]
pub struct ExcludeArgs {
    #[command(subcommand)]
    pub action: ExcludeAction,
}

#[derive(Subcommand, Debug)]
pub enum ExcludeAction {
    /// Hide an asset from balance and portfolio views
    Add {
        asset: String,

        /// Why the asset is excluded
        #[arg(long, default_value = "cannot currently be liquidated")]
        reason: String,
    },

    /// Make an asset visible again
    Remove { asset: String },

    /// List the exclusion registry
    List,
}

pub async fn execute(service: &PortfolioService, args: ExcludeArgs) -> Result<()> {
    match args.action {
        ExcludeAction::Add { asset, reason } => {
            if service.exclude_asset(&asset, &reason).await? {
                println!("{}", format!("🚫 {} excluded from views", asset).yellow());
            } else {
                println!("{} is already excluded", asset);
            }
        }
        ExcludeAction::Remove { asset } => {
            if service.include_asset(&asset).await? {
                println!("{}", format!("✅ {} visible again", asset).bright_green());
            } else {
                println!("{} was not excluded", asset);
            }
        }
        ExcludeAction::List => {
            let entries = service.list_exclusions().await?;
            println!("{}", display::exclusions_table(&entries));
        }
    }
    Ok(())
}
