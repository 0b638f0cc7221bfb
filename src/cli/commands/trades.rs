//! Trade history command for viewing past trades

use anyhow::Result;
use clap::Args;

use crate::ledger::TradeSide;
use crate::portfolio::{display, HistoryFilter, PortfolioService};

#[derive(Args, Debug)]
pub struct TradesArgs {
    /// Filter by pair symbol, e.g. ETHUSDT
    #[arg(long)]
    pub symbol: Option<String>,

    /// Filter by side: BUY or SELL
    #[arg(long)]
    pub side: Option<String>,

    /// Number of trades to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Number of trades to skip (for paging)
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

pub async fn execute(service: &PortfolioService, args: TradesArgs) -> Result<()> {
    let side = match &args.side {
        Some(raw) => Some(TradeSide::parse(raw)?),
        None => None,
    };

    let trades = service
        .get_trade_history(HistoryFilter {
            symbol: args.symbol,
            side,
            limit: Some(args.limit),
            offset: Some(args.offset),
        })
        .await?;

    println!("\n📈 Trade History\n");
    println!("{}", display::trades_table(&trades));
    Ok(())
}
