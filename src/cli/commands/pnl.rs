use anyhow::{bail, Result};
use clap::Args;

use crate::portfolio::{display, PortfolioService};
use crate::timeutil;

#[derive(Args, Debug)]
pub struct PnlArgs {
    /// Window start: milliseconds or "YYYY-MM-DD HH:MM:SS"
    #[arg(long)]
    pub start: Option<String>,

    /// Window end: milliseconds or "YYYY-MM-DD HH:MM:SS"
    #[arg(long)]
    pub end: Option<String>,

    /// Run the lifetime FIFO lot-matching report instead of the
    /// time-ranged weighted-average report
    #[arg(long)]
    pub fifo: bool,

    /// Print the raw JSON report instead of tables
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(service: &PortfolioService, args: PnlArgs) -> Result<()> {
    if args.fifo {
        let report = service.get_pnl_fifo().await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", display::render_fifo(&report));
        }
        return Ok(());
    }

    let (Some(start), Some(end)) = (&args.start, &args.end) else {
        bail!("--start and --end are required (or pass --fifo for the lifetime report)");
    };

    let start_ts = timeutil::parse_time_arg(start)?;
    let end_ts = timeutil::parse_time_arg(end)?;

    let report = service.get_pnl(start_ts, end_ts).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", display::render_pnl(&report));
    }
    Ok(())
}
