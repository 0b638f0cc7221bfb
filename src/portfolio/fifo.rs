//! Alternate realized-PnL model: FIFO lot matching
//!
//! Lifetime-scoped: every sell is matched against the oldest remaining buy
//! lots of the same asset, and a quote-denominated sell commission is split
//! proportionally across the matched fragments. This can disagree with the
//! weighted-average figures on mixed buy/sell sequences; weighted-average
//! cost stays the canonical model, this report is the documented variant.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;

use crate::ledger::{Trade, TradeSide};
use crate::portfolio::types::FifoPnlReport;

#[derive(Debug)]
struct Lot {
    quantity: Decimal,
    unit_cost: Decimal,
}

/// Run the lot matcher over trades in ascending time order.
pub fn calculate_fifo(trades: &[Trade]) -> FifoPnlReport {
    let mut lots: HashMap<String, VecDeque<Lot>> = HashMap::new();
    let mut per_asset: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut unmatched_sells: BTreeMap<String, Decimal> = BTreeMap::new();

    for trade in trades {
        let asset = trade.base_asset().to_string();

        match trade.side {
            TradeSide::Buy => {
                // fee paid in kind shrinks the lot we actually hold
                let mut quantity = trade.quantity;
                if trade.commission > Decimal::ZERO && trade.commission_asset == asset {
                    quantity -= trade.commission;
                }
                if quantity <= Decimal::ZERO {
                    continue;
                }

                lots.entry(asset).or_default().push_back(Lot {
                    quantity,
                    unit_cost: trade.quote_qty / trade.quantity,
                });
            }
            TradeSide::Sell => {
                let queue = lots.entry(asset.clone()).or_default();
                let quote_fee = if trade.commission_asset == trade.quote_asset() {
                    trade.commission
                } else {
                    Decimal::ZERO
                };

                let mut remaining = trade.quantity;
                let mut realized = Decimal::ZERO;

                while remaining > Decimal::ZERO {
                    let Some(front) = queue.front_mut() else {
                        // nothing left to match: booked at zero PnL, same
                        // policy as selling an untracked inflow
                        *unmatched_sells.entry(asset.clone()).or_default() += remaining;
                        break;
                    };

                    let matched = front.quantity.min(remaining);
                    let fee_share = quote_fee * matched / trade.quantity;
                    realized += (trade.price - front.unit_cost) * matched - fee_share;

                    front.quantity -= matched;
                    if front.quantity.is_zero() {
                        queue.pop_front();
                    }
                    remaining -= matched;
                }

                debug!(
                    asset = %asset,
                    trade_id = %trade.id,
                    realized = %realized,
                    "Matched sell against FIFO lots"
                );
                *per_asset.entry(asset).or_default() += realized;
            }
        }
    }

    FifoPnlReport {
        realized_pnl: per_asset.values().copied().sum(),
        per_asset,
        unmatched_sells,
    }
}
