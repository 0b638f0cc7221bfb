use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use rust_decimal::Decimal;

use crate::ledger::TradeDraft;
use crate::portfolio::PortfolioService;
use crate::timeutil;

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Pair symbol, e.g. ETHUSDT or ETH/USDT
    pub symbol: String,

    /// Trade side: BUY or SELL
    pub side: String,

    /// Executed quantity in the base asset
    #[arg(long)]
    pub quantity: Decimal,

    /// Execution price
    #[arg(long)]
    pub price: Decimal,

    /// Quote amount actually exchanged (defaults to quantity * price)
    #[arg(long)]
    pub quote_qty: Option<Decimal>,

    /// Commission charged for the fill
    #[arg(long, default_value = "0")]
    pub commission: Decimal,

    /// Asset the commission was paid in (defaults to USDT)
    #[arg(long)]
    pub commission_asset: Option<String>,

    /// Execution time: milliseconds or "YYYY-MM-DD HH:MM:SS" (defaults to now)
    #[arg(long)]
    pub time: Option<String>,

    /// Order type label, e.g. MARKET or LIMIT
    #[arg(long, default_value = "MARKET")]
    pub order_type: String,
}

pub async fn execute(service: &PortfolioService, args: RecordArgs) -> Result<()> {
    let timestamp = match &args.time {
        Some(raw) => timeutil::parse_time_arg(raw)?,
        None => timeutil::now_ms(),
    };

    let draft = TradeDraft {
        symbol: args.symbol,
        side: args.side,
        quantity: args.quantity,
        price: args.price,
        quote_qty: args.quote_qty,
        commission: args.commission,
        commission_asset: args.commission_asset,
        timestamp,
        order_type: Some(args.order_type),
        exchange_order_id: None,
    };

    let trade_id = service.record_trade(draft).await?;
    println!("{}", format!("✅ Trade recorded: {}", trade_id).bright_green());
    Ok(())
}
