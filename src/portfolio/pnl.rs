//! Time-ranged PnL report over the ledger window
//!
//! Realized PnL here is the window-scoped cash-flow measure (quote received
//! from sells minus quote spent on buys). It is deliberately distinct from
//! the per-trade realized-PnL log, which is average-cost based and
//! lifetime-scoped. Unrealized PnL prices the live holdings via the exchange
//! oracle; a failed lookup degrades that asset's figure to zero and marks it,
//! it never fails the report.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

use crate::config::QUOTE_CURRENCY;
use crate::exchange::ExchangeDataSource;
use crate::ledger::{Trade, TradeSide};
use crate::portfolio::types::{AssetPnlBreakdown, PnlReport, PnlSummary, Position};

pub struct PnlCalculator<'a> {
    oracle: &'a dyn ExchangeDataSource,
}

/// Window-scoped accumulation, one pass over the trades
#[derive(Debug, Default)]
struct WindowTotals {
    usdt_spent: Decimal,
    usdt_received: Decimal,
    holdings: HashMap<String, Decimal>,
    cost_basis: HashMap<String, Decimal>,
    sales_revenue: HashMap<String, Decimal>,
    fees: BTreeMap<String, Decimal>,
}

fn accumulate(trades: &[Trade]) -> WindowTotals {
    let mut totals = WindowTotals::default();

    for trade in trades {
        let base = trade.base_asset().to_string();

        *totals.fees.entry(trade.commission_asset.clone()).or_default() += trade.commission;

        match trade.side {
            TradeSide::Buy => {
                totals.usdt_spent += trade.quote_qty;
                *totals.holdings.entry(base.clone()).or_default() += trade.quantity;
                *totals.cost_basis.entry(base.clone()).or_default() += trade.quote_qty;

                if trade.commission_asset == base {
                    *totals.holdings.entry(base).or_default() -= trade.commission;
                }
            }
            TradeSide::Sell => {
                totals.usdt_received += trade.quote_qty;
                *totals.holdings.entry(base.clone()).or_default() -= trade.quantity;
                *totals.sales_revenue.entry(base.clone()).or_default() += trade.quote_qty;

                if trade.commission_asset == trade.quote_asset() {
                    totals.usdt_received -= trade.commission;
                    *totals.sales_revenue.entry(base).or_default() -= trade.commission;
                }
            }
        }
    }

    totals
}

impl<'a> PnlCalculator<'a> {
    pub fn new(oracle: &'a dyn ExchangeDataSource) -> Self {
        Self { oracle }
    }

    /// Build the report for trades already fetched from the ledger.
    /// `live_positions` supplies the authoritative holdings for unrealized
    /// PnL; assets without a tracked position fall back to the windowed
    /// reconstruction.
    pub async fn calculate(
        &self,
        trades: &[Trade],
        live_positions: &HashMap<String, Position>,
        start_ts: i64,
        end_ts: i64,
    ) -> PnlReport {
        let totals = accumulate(trades);
        let realized_total = totals.usdt_received - totals.usdt_spent;

        // every asset the window touched, in deterministic order
        let assets: BTreeSet<String> = totals
            .holdings
            .keys()
            .chain(totals.cost_basis.keys())
            .chain(totals.sales_revenue.keys())
            .cloned()
            .collect();

        let mut breakdown = BTreeMap::new();
        let mut degraded_assets = Vec::new();
        let mut unrealized_total = Decimal::ZERO;

        for asset in assets {
            let cost = totals.cost_basis.get(&asset).copied().unwrap_or_default();
            let sales = totals
                .sales_revenue
                .get(&asset)
                .copied()
                .unwrap_or_default();
            let asset_realized = sales - cost;

            let holding = match live_positions.get(&asset) {
                Some(position) => position.total_quantity(),
                None => totals.holdings.get(&asset).copied().unwrap_or_default(),
            };

            let mut entry = AssetPnlBreakdown {
                current_balance: holding,
                total_cost: cost,
                total_sales: sales,
                current_price: Decimal::ZERO,
                current_value: Decimal::ZERO,
                realized_pnl: asset_realized,
                unrealized_pnl: Decimal::ZERO,
                total_pnl: asset_realized,
                price_degraded: false,
            };

            if holding > Decimal::ZERO {
                let symbol = format!("{}{}", asset, QUOTE_CURRENCY);
                match self.oracle.current_price(&symbol).await {
                    Ok(price) => {
                        let value = holding * price;
                        // remaining holdings carry the cost basis not yet
                        // recovered by in-window sales
                        let remaining_cost = if cost > Decimal::ZERO && sales > Decimal::ZERO {
                            (cost - sales).max(Decimal::ZERO)
                        } else {
                            cost
                        };
                        entry.current_price = price;
                        entry.current_value = value;
                        entry.unrealized_pnl = value - remaining_cost;
                        entry.total_pnl = asset_realized + entry.unrealized_pnl;
                        unrealized_total += entry.unrealized_pnl;
                    }
                    Err(e) => {
                        warn!(asset = %asset, error = %e, "Price lookup failed, unrealized PnL degraded to zero");
                        entry.price_degraded = true;
                        degraded_assets.push(asset.clone());
                    }
                }
            }

            breakdown.insert(asset, entry);
        }

        let total_pnl = realized_total + unrealized_total;
        let roi_percent = if totals.usdt_spent > Decimal::ZERO {
            total_pnl / totals.usdt_spent * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        PnlReport {
            start_ts,
            end_ts,
            summary: PnlSummary {
                usdt_spent: totals.usdt_spent,
                usdt_received: totals.usdt_received,
                realized_pnl: realized_total,
                unrealized_pnl: unrealized_total,
                total_pnl,
                roi_percent,
            },
            assets: breakdown,
            fees: totals.fees,
            degraded_assets,
        }
    }
}
