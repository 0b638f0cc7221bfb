//! Portfolio-level analytics, derived on read from positions and the ledger

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::ledger::Trade;
use crate::portfolio::types::{
    AllocationSlice, AnalyticsReport, PerformerEntry, Position, RealizedPnlEntry, TradingStats,
};

use crate::timeutil::MS_PER_DAY;

const PERFORMER_LIMIT: usize = 5;

/// Compute the full analytics report. Positions are expected to be priced
/// and view-filtered already; trades and realized entries cover all history.
pub fn compute(
    positions: &BTreeMap<String, Position>,
    trades: &[Trade],
    realized: &[RealizedPnlEntry],
    now_ms: i64,
) -> AnalyticsReport {
    let total_portfolio_value: Decimal = positions.values().map(|p| p.current_value()).sum();
    let total_invested: Decimal = positions.values().map(|p| p.total_invested).sum();
    let total_unrealized_pnl: Decimal = positions.values().map(|p| p.unrealized_pnl).sum();

    let total_unrealized_pnl_percent = if total_invested > Decimal::ZERO {
        total_unrealized_pnl / total_invested * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let total_realized_pnl: Decimal = realized.iter().map(|e| e.realized_pnl).sum();

    let mut asset_allocation = BTreeMap::new();
    if total_portfolio_value > Decimal::ZERO {
        for (asset, position) in positions {
            let value = position.current_value();
            asset_allocation.insert(
                asset.clone(),
                AllocationSlice {
                    value,
                    percentage: value / total_portfolio_value * Decimal::ONE_HUNDRED,
                    quantity: position.total_quantity(),
                },
            );
        }
    }

    // sorted descending by unrealized percentage; the bottom list may overlap
    // the top list when fewer than ten positions exist
    let mut performers: Vec<PerformerEntry> = positions
        .values()
        .map(|p| PerformerEntry {
            asset: p.asset.clone(),
            unrealized_pnl_percent: p.unrealized_pnl_percent,
        })
        .collect();
    performers.sort_by(|a, b| {
        b.unrealized_pnl_percent
            .cmp(&a.unrealized_pnl_percent)
            .then_with(|| a.asset.cmp(&b.asset))
    });

    let top_performers: Vec<PerformerEntry> =
        performers.iter().take(PERFORMER_LIMIT).cloned().collect();
    // worst first, walking the sorted list from the tail
    let worst_performers: Vec<PerformerEntry> = performers
        .iter()
        .rev()
        .take(PERFORMER_LIMIT)
        .cloned()
        .collect();

    AnalyticsReport {
        total_portfolio_value,
        total_invested,
        total_unrealized_pnl,
        total_unrealized_pnl_percent,
        total_realized_pnl,
        asset_allocation,
        top_performers,
        worst_performers,
        trading_stats: trading_stats(trades),
        last_updated: now_ms,
    }
}

/// Trading-frequency statistics over the given trades (ascending by time).
fn trading_stats(trades: &[Trade]) -> TradingStats {
    if trades.is_empty() {
        return TradingStats {
            total_trades: 0,
            buy_trades: 0,
            sell_trades: 0,
            total_volume: Decimal::ZERO,
            avg_trade_size: Decimal::ZERO,
            most_traded_asset: None,
            trades_per_day: Decimal::ZERO,
        };
    }

    let buy_trades = trades
        .iter()
        .filter(|t| t.side == crate::ledger::TradeSide::Buy)
        .count();
    let total_volume: Decimal = trades.iter().map(|t| t.quote_qty).sum();
    let avg_trade_size = total_volume / Decimal::from(trades.len());

    // count trades per base asset, preserving first-encountered order so a
    // tie resolves to the asset seen first
    let mut asset_counts: Vec<(String, usize)> = Vec::new();
    for trade in trades {
        let base = trade.base_asset();
        match asset_counts.iter_mut().find(|(asset, _)| asset == base) {
            Some((_, count)) => *count += 1,
            None => asset_counts.push((base.to_string(), 1)),
        }
    }
    let most_traded_asset = asset_counts
        .iter()
        .fold(None::<&(String, usize)>, |best, candidate| match best {
            Some(current) if candidate.1 <= current.1 => Some(current),
            _ => Some(candidate),
        })
        .map(|(asset, _)| asset.clone());

    let first_ts = trades.iter().map(|t| t.timestamp).min().unwrap_or(0);
    let last_ts = trades.iter().map(|t| t.timestamp).max().unwrap_or(0);
    // floor the observed span at one day to guard the division
    let span_days = (Decimal::from(last_ts - first_ts) / Decimal::from(MS_PER_DAY)).max(Decimal::ONE);
    let trades_per_day = (Decimal::from(trades.len()) / span_days).round_dp(2);

    TradingStats {
        total_trades: trades.len(),
        buy_trades,
        sell_trades: trades.len() - buy_trades,
        total_volume,
        avg_trade_size,
        most_traded_asset,
        trades_per_day,
    }
}
