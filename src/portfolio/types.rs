//! Portfolio type definitions with strong typing

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::Trade;

/// Holdings and cost basis for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub asset: String,
    pub free_qty: Decimal,
    pub locked_qty: Decimal,
    /// Weighted-average acquisition price per unit; changes only on buys
    pub avg_cost: Decimal,
    /// Authoritative running total; reduced proportionally on sells
    pub total_invested: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_percent: Decimal,
    pub last_updated: i64,
}

impl Position {
    pub fn total_quantity(&self) -> Decimal {
        self.free_qty + self.locked_qty
    }

    pub fn current_value(&self) -> Decimal {
        self.total_quantity() * self.current_price
    }
}

/// Profit locked in by one sell, computed with the position's average cost
/// at the moment of the sale. Append-only; later trades never alter it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealizedPnlEntry {
    pub asset: String,
    pub trade_id: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub sell_price: Decimal,
    pub realized_pnl: Decimal,
    pub timestamp: i64,
}

/// Asset hidden from balance/portfolio views until explicitly removed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionEntry {
    pub asset: String,
    pub reason: String,
    pub added_at: i64,
}

/// One row of the balances view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRow {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// One asset's share of the portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub value: Decimal,
    pub percentage: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformerEntry {
    pub asset: String,
    pub unrealized_pnl_percent: Decimal,
}

/// Trading-frequency statistics over the full ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingStats {
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub total_volume: Decimal,
    pub avg_trade_size: Decimal,
    pub most_traded_asset: Option<String>,
    /// Trades per day over the observed span, floored at one day
    pub trades_per_day: Decimal,
}

/// Portfolio-level analytics, recomputed on read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub total_portfolio_value: Decimal,
    pub total_invested: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_unrealized_pnl_percent: Decimal,
    pub total_realized_pnl: Decimal,
    pub asset_allocation: BTreeMap<String, AllocationSlice>,
    pub top_performers: Vec<PerformerEntry>,
    /// May overlap `top_performers` when fewer than ten positions exist
    pub worst_performers: Vec<PerformerEntry>,
    pub trading_stats: TradingStats,
    pub last_updated: i64,
}

/// Summary totals of a time-ranged PnL report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlSummary {
    pub usdt_spent: Decimal,
    pub usdt_received: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    pub roi_percent: Decimal,
}

/// Per-asset breakdown of a time-ranged PnL report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPnlBreakdown {
    pub current_balance: Decimal,
    pub total_cost: Decimal,
    pub total_sales: Decimal,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    /// Set when the price lookup failed and the unrealized figure degraded to 0
    pub price_degraded: bool,
}

/// Time-ranged PnL report (weighted-average cash-flow model)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlReport {
    pub start_ts: i64,
    pub end_ts: i64,
    pub summary: PnlSummary,
    pub assets: BTreeMap<String, AssetPnlBreakdown>,
    /// Commission totals keyed by the asset they were paid in
    pub fees: BTreeMap<String, Decimal>,
    /// Assets whose unrealized figure degraded because pricing failed
    pub degraded_assets: Vec<String>,
}

/// Lifetime FIFO lot-matching report, the alternate realized-PnL model.
/// Can disagree with the weighted-average figures on mixed sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FifoPnlReport {
    pub realized_pnl: Decimal,
    pub per_asset: BTreeMap<String, Decimal>,
    /// Sell quantity that had no remaining buy lot to match (booked at zero PnL)
    pub unmatched_sells: BTreeMap<String, Decimal>,
}

/// Windowed per-asset performance metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPerformance {
    pub asset: String,
    pub period_days: i64,
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub total_bought: Decimal,
    pub total_sold: Decimal,
    pub net_position: Decimal,
    /// Volume-weighted average prices over the window
    pub avg_buy_price: Decimal,
    pub avg_sell_price: Decimal,
    pub current_holding: Option<Position>,
}

/// Exported portfolio report document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub generated_at: i64,
    pub analytics: AnalyticsReport,
    pub holdings: BTreeMap<String, Position>,
    pub recent_trades: Vec<Trade>,
    pub realized_pnl_history: Vec<RealizedPnlEntry>,
}
