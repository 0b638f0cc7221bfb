//! Position tracking: weighted-average cost basis over the trade stream
//!
//! Invariants enforced here:
//! - `avg_cost` changes only on buys; sells reduce `total_invested`
//!   proportionally and leave `avg_cost` untouched.
//! - A position whose quantity falls to or below the dust threshold after a
//!   sell is removed outright; residual dust is dropped, not refunded.
//! - Every sell produces exactly one realized-PnL entry, computed with the
//!   average cost at the moment of the sale. A sell against an untracked
//!   asset is booked at zero PnL (no cost basis is guessed).

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::ledger::{Trade, TradeSide};
use crate::portfolio::types::{Position, RealizedPnlEntry};

pub struct PositionTracker {
    dust_threshold: Decimal,
}

impl PositionTracker {
    pub fn new(dust_threshold: Decimal) -> Self {
        Self { dust_threshold }
    }

    /// Apply one executed trade to the position map. Returns the realized-PnL
    /// entry when the trade was a sell.
    pub fn apply_trade(
        &self,
        positions: &mut HashMap<String, Position>,
        trade: &Trade,
    ) -> Option<RealizedPnlEntry> {
        match trade.side {
            TradeSide::Buy => {
                self.apply_buy(positions, trade);
                None
            }
            TradeSide::Sell => Some(self.apply_sell(positions, trade)),
        }
    }

    fn apply_buy(&self, positions: &mut HashMap<String, Position>, trade: &Trade) {
        let asset = trade.base_asset().to_string();

        let position = positions.entry(asset.clone()).or_insert_with(|| Position {
            asset: asset.clone(),
            free_qty: Decimal::ZERO,
            locked_qty: Decimal::ZERO,
            avg_cost: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            current_price: trade.price,
            unrealized_pnl: Decimal::ZERO,
            unrealized_pnl_percent: Decimal::ZERO,
            last_updated: trade.timestamp,
        });

        let old_total = position.total_quantity();
        let new_total = old_total + trade.quantity;

        position.avg_cost = if old_total.is_zero() {
            trade.price
        } else {
            (old_total * position.avg_cost + trade.quote_qty) / new_total
        };
        position.total_invested = new_total * position.avg_cost;
        position.free_qty += trade.quantity;

        // A fee paid in kind reduces what we actually hold without touching
        // the cost basis of the remainder.
        if trade.commission > Decimal::ZERO && trade.commission_asset == asset {
            position.free_qty -= trade.commission;
        }

        position.last_updated = trade.timestamp;

        debug!(
            asset = %asset,
            quantity = %trade.quantity,
            avg_cost = %position.avg_cost,
            "Applied buy to position"
        );
    }

    fn apply_sell(
        &self,
        positions: &mut HashMap<String, Position>,
        trade: &Trade,
    ) -> RealizedPnlEntry {
        let asset = trade.base_asset().to_string();

        let realized_pnl = match positions.get_mut(&asset) {
            Some(position) => {
                if trade.quantity > position.total_quantity() {
                    warn!(
                        asset = %asset,
                        sell_qty = %trade.quantity,
                        held = %position.total_quantity(),
                        "Sell size exceeds tracked position"
                    );
                }

                let realized = (trade.price - position.avg_cost) * trade.quantity;

                position.free_qty -= trade.quantity;
                position.total_invested -= position.avg_cost * trade.quantity;
                position.last_updated = trade.timestamp;

                if position.total_quantity() <= self.dust_threshold {
                    positions.remove(&asset);
                    debug!(asset = %asset, "Position closed, residual dust dropped");
                }

                realized
            }
            // Untracked inflow being sold: no cost basis to realize against.
            None => {
                debug!(asset = %asset, "Sell against untracked asset, realized PnL booked as zero");
                Decimal::ZERO
            }
        };

        RealizedPnlEntry {
            asset,
            trade_id: trade.id.clone(),
            symbol: trade.symbol.clone(),
            quantity: trade.quantity,
            sell_price: trade.price,
            realized_pnl,
            timestamp: trade.timestamp,
        }
    }

    /// Mark a position to the given price, recomputing unrealized PnL.
    pub fn refresh_price(&self, position: &mut Position, price: Decimal, now_ms: i64) {
        position.current_price = price;
        position.unrealized_pnl = (price - position.avg_cost) * position.total_quantity();
        position.unrealized_pnl_percent = if position.avg_cost.is_zero() {
            Decimal::ZERO
        } else {
            (price - position.avg_cost) / position.avg_cost * Decimal::ONE_HUNDRED
        };
        position.last_updated = now_ms;
    }
}
