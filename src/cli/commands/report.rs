use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::portfolio::PortfolioService;

#[derive(Args, Debug)]
pub struct ReportArgs {}

pub async fn execute(service: &PortfolioService, _args: ReportArgs) -> Result<()> {
    println!("{}", "📝 Building portfolio report...".bright_blue());

    let (path, report) = service.export_report().await?;
    println!(
        "{}",
        format!(
            "✅ Report with {} holdings and {} recent trades written to {}",
            report.holdings.len(),
            report.recent_trades.len(),
            path.display()
        )
        .bright_green()
    );
    Ok(())
}
