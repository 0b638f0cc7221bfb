//! Portfolio service: the operations exposed to callers
//!
//! One facade wires the ledger, position store, realized-PnL log, exclusion
//! registry and the exchange collaborator together. Every durable collection
//! serializes its own mutations; reads may run concurrently. Exchange
//! failures degrade the affected figures, they never fail a whole request.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Settings, QUOTE_CURRENCY};
use crate::data_paths::DataPaths;
use crate::errors::{PaperbotError, Result};
use crate::exchange::ExchangeDataSource;
use crate::ledger::{Trade, TradeDraft, TradeLedger, TradeSide};
use crate::persist;
use crate::portfolio::analytics;
use crate::portfolio::exclusions::ExclusionRegistry;
use crate::portfolio::fifo;
use crate::portfolio::pnl::PnlCalculator;
use crate::portfolio::store::{AnalyticsStore, PositionStore, RealizedPnlLog};
use crate::portfolio::tracker::PositionTracker;
use crate::portfolio::types::{
    AnalyticsReport, AssetPerformance, BalanceRow, ExclusionEntry, FifoPnlReport, PnlReport,
    PortfolioReport, Position,
};
use crate::timeutil::{self, MS_PER_DAY};

/// Trade-history paging and filtering
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub symbol: Option<String>,
    pub side: Option<TradeSide>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, Copy)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub added: usize,
    pub removed: usize,
}

pub struct PortfolioService {
    settings: Settings,
    data_paths: DataPaths,
    ledger: TradeLedger,
    positions: PositionStore,
    realized: RealizedPnlLog,
    exclusions: ExclusionRegistry,
    analytics: AnalyticsStore,
    tracker: PositionTracker,
    exchange: Arc<dyn ExchangeDataSource>,
}

impl PortfolioService {
    pub fn new(
        settings: Settings,
        data_paths: DataPaths,
        exchange: Arc<dyn ExchangeDataSource>,
    ) -> Self {
        let tracker = PositionTracker::new(settings.dust_threshold);
        Self {
            ledger: TradeLedger::new(&data_paths),
            positions: PositionStore::new(&data_paths),
            realized: RealizedPnlLog::new(&data_paths),
            exclusions: ExclusionRegistry::new(&data_paths),
            analytics: AnalyticsStore::new(&data_paths),
            tracker,
            settings,
            data_paths,
            exchange,
        }
    }

    /// Record an executed trade: normalize, append to the ledger, update the
    /// position and, on a sell, log the realized PnL.
    pub async fn record_trade(&self, draft: TradeDraft) -> Result<String> {
        let trade = Trade::from_draft(draft)?;

        self.ledger.append(&trade).await?;

        let realized_entry = self
            .positions
            .mutate(|map| self.tracker.apply_trade(map, &trade))
            .await?;

        if let Some(entry) = realized_entry {
            self.realized.append(&entry).await?;
            info!(
                asset = %entry.asset,
                realized_pnl = %entry.realized_pnl,
                "Realized PnL logged"
            );
        }

        info!(
            trade_id = %trade.id,
            symbol = %trade.symbol,
            side = %trade.side,
            quantity = %trade.quantity,
            price = %trade.price,
            "Recorded trade"
        );
        Ok(trade.id)
    }

    /// Current holdings, priced best-effort, with excluded assets and dust
    /// filtered out.
    pub async fn get_positions(&self) -> Result<BTreeMap<String, Position>> {
        let excluded = self.exclusions.asset_set().await?;
        let positions = self.positions.load().await?;
        let now = timeutil::now_ms();

        let mut view = BTreeMap::new();
        for (asset, mut position) in positions {
            if excluded.contains(&asset)
                || position.total_quantity() <= self.settings.dust_threshold
            {
                continue;
            }

            let symbol = format!("{}{}", asset, QUOTE_CURRENCY);
            match self.exchange.current_price(&symbol).await {
                Ok(price) => self.tracker.refresh_price(&mut position, price, now),
                Err(e) => {
                    // keep the previous snapshot rather than fail the view
                    warn!(asset = %asset, error = %e, "Price refresh failed, keeping previous snapshot");
                }
            }
            view.insert(asset, position);
        }

        Ok(view)
    }

    /// Balance rows for the tracked portfolio, exclusion-filtered.
    pub async fn get_balances(&self) -> Result<Vec<BalanceRow>> {
        let excluded = self.exclusions.asset_set().await?;
        let positions = self.positions.load().await?;

        let mut rows: Vec<BalanceRow> = positions
            .into_iter()
            .filter(|(asset, position)| {
                !excluded.contains(asset)
                    && position.total_quantity() > self.settings.dust_threshold
            })
            .map(|(asset, position)| BalanceRow {
                asset,
                free: position.free_qty,
                locked: position.locked_qty,
            })
            .collect();
        rows.sort_by(|a, b| a.asset.cmp(&b.asset));
        Ok(rows)
    }

    /// Free quote-currency balance straight from the exchange.
    pub async fn get_quote_balance(&self) -> Result<Decimal> {
        let balances = self
            .exchange
            .account_balances()
            .await
            .map_err(PaperbotError::from)?;

        Ok(balances
            .iter()
            .find(|b| b.asset == QUOTE_CURRENCY)
            .map(|b| b.free)
            .unwrap_or_default())
    }

    /// Recompute portfolio analytics and persist the snapshot.
    pub async fn get_analytics(&self) -> Result<AnalyticsReport> {
        let positions = self.get_positions().await?;
        let trades = self.ledger.all().await?;
        let realized = self.realized.all().await?;

        let report = analytics::compute(&positions, &trades, &realized, timeutil::now_ms());
        self.analytics.save(&report).await?;
        Ok(report)
    }

    /// Time-ranged PnL report (weighted-average cash-flow model).
    pub async fn get_pnl(&self, start_ts: i64, end_ts: i64) -> Result<PnlReport> {
        let trades = self.ledger.query(start_ts, end_ts).await?;
        let live_positions = self.positions.load().await?;

        let calculator = PnlCalculator::new(self.exchange.as_ref());
        Ok(calculator
            .calculate(&trades, &live_positions, start_ts, end_ts)
            .await)
    }

    /// Lifetime FIFO lot-matching report, the alternate realized-PnL model.
    pub async fn get_pnl_fifo(&self) -> Result<FifoPnlReport> {
        let trades = self.ledger.all().await?;
        Ok(fifo::calculate_fifo(&trades))
    }

    /// Trade history, newest first, with optional symbol/side filters and paging.
    pub async fn get_trade_history(&self, filter: HistoryFilter) -> Result<Vec<Trade>> {
        let mut trades = self.ledger.all().await?;

        if let Some(symbol) = &filter.symbol {
            let normalized = symbol.replace('/', "").to_uppercase();
            trades.retain(|t| t.symbol == normalized);
        }
        if let Some(side) = filter.side {
            trades.retain(|t| t.side == side);
        }

        trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let page = trades.into_iter().skip(filter.offset.unwrap_or(0));
        Ok(match filter.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }

    /// Overwrite tracked quantities with the exchange's ground truth, seed
    /// previously-untracked assets at the current price, and drop assets the
    /// exchange no longer reports. Operates on the unfiltered report;
    /// exclusions only apply to views.
    pub async fn reconcile_with_exchange(&self) -> Result<ReconcileSummary> {
        let balances = self
            .exchange
            .account_balances()
            .await
            .map_err(PaperbotError::from)?;

        // price the assets we are about to start tracking before entering
        // the store's write path
        let tracked = self.positions.load().await?;
        let mut seed_prices: HashMap<String, Decimal> = HashMap::new();
        for balance in &balances {
            if balance.asset == QUOTE_CURRENCY || tracked.contains_key(&balance.asset) {
                continue;
            }
            let symbol = format!("{}{}", balance.asset, QUOTE_CURRENCY);
            let price = match self.exchange.current_price(&symbol).await {
                Ok(price) => price,
                Err(e) => {
                    warn!(asset = %balance.asset, error = %e, "No price for new asset, seeding cost basis at zero");
                    Decimal::ZERO
                }
            };
            seed_prices.insert(balance.asset.clone(), price);
        }

        let now = timeutil::now_ms();
        let summary = self
            .positions
            .mutate(|map| {
                let reported: HashSet<&str> = balances
                    .iter()
                    .filter(|b| b.asset != QUOTE_CURRENCY)
                    .map(|b| b.asset.as_str())
                    .collect();

                let mut updated = 0;
                let mut added = 0;
                for balance in &balances {
                    if balance.asset == QUOTE_CURRENCY {
                        continue;
                    }
                    match map.get_mut(&balance.asset) {
                        Some(position) => {
                            position.free_qty = balance.free;
                            position.locked_qty = balance.locked;
                            position.last_updated = now;
                            updated += 1;
                        }
                        None => {
                            let price = seed_prices
                                .get(&balance.asset)
                                .copied()
                                .unwrap_or_default();
                            let quantity = balance.free + balance.locked;
                            map.insert(
                                balance.asset.clone(),
                                Position {
                                    asset: balance.asset.clone(),
                                    free_qty: balance.free,
                                    locked_qty: balance.locked,
                                    avg_cost: price,
                                    total_invested: quantity * price,
                                    current_price: price,
                                    unrealized_pnl: Decimal::ZERO,
                                    unrealized_pnl_percent: Decimal::ZERO,
                                    last_updated: now,
                                },
                            );
                            added += 1;
                        }
                    }
                }

                let stale: Vec<String> = map
                    .keys()
                    .filter(|asset| !reported.contains(asset.as_str()))
                    .cloned()
                    .collect();
                for asset in &stale {
                    map.remove(asset);
                }

                ReconcileSummary {
                    updated,
                    added,
                    removed: stale.len(),
                }
            })
            .await?;

        info!(
            updated = summary.updated,
            added = summary.added,
            removed = summary.removed,
            "Reconciled positions with exchange"
        );
        Ok(summary)
    }

    /// Windowed performance metrics for one asset.
    pub async fn asset_performance(&self, asset: &str, days: i64) -> Result<AssetPerformance> {
        if days <= 0 {
            return Err(PaperbotError::Validation(format!(
                "invalid period {} days: must be greater than 0",
                days
            )));
        }

        let asset = asset.trim().to_uppercase();
        let cutoff = timeutil::now_ms() - days * MS_PER_DAY;

        let trades: Vec<Trade> = self
            .ledger
            .all()
            .await?
            .into_iter()
            .filter(|t| t.base_asset() == asset && t.timestamp >= cutoff)
            .collect();

        let mut total_bought = Decimal::ZERO;
        let mut total_sold = Decimal::ZERO;
        let mut buy_notional = Decimal::ZERO;
        let mut sell_notional = Decimal::ZERO;
        let mut buy_trades = 0;

        for trade in &trades {
            match trade.side {
                TradeSide::Buy => {
                    total_bought += trade.quantity;
                    buy_notional += trade.price * trade.quantity;
                    buy_trades += 1;
                }
                TradeSide::Sell => {
                    total_sold += trade.quantity;
                    sell_notional += trade.price * trade.quantity;
                }
            }
        }

        let excluded = self.exclusions.asset_set().await?;
        let current_holding = if excluded.contains(&asset) {
            None
        } else {
            self.positions.load().await?.remove(&asset)
        };

        Ok(AssetPerformance {
            avg_buy_price: if total_bought > Decimal::ZERO {
                buy_notional / total_bought
            } else {
                Decimal::ZERO
            },
            avg_sell_price: if total_sold > Decimal::ZERO {
                sell_notional / total_sold
            } else {
                Decimal::ZERO
            },
            net_position: total_bought - total_sold,
            total_trades: trades.len(),
            sell_trades: trades.len() - buy_trades,
            buy_trades,
            total_bought,
            total_sold,
            asset,
            period_days: days,
            current_holding,
        })
    }

    /// Export the combined portfolio report to a timestamped file.
    pub async fn export_report(&self) -> Result<(PathBuf, PortfolioReport)> {
        let analytics = self.get_analytics().await?;
        let holdings = self.get_positions().await?;
        let recent_trades = self
            .get_trade_history(HistoryFilter {
                limit: Some(50),
                ..Default::default()
            })
            .await?;
        let realized_pnl_history = self.realized.all().await?;

        let report = PortfolioReport {
            generated_at: timeutil::now_ms(),
            analytics,
            holdings,
            recent_trades,
            realized_pnl_history,
        };

        let path = self
            .data_paths
            .reports()
            .join(format!("portfolio_report_{}.json", report.generated_at / 1000));
        persist::save_document(&path, &report).await?;

        info!(path = %path.display(), "Exported portfolio report");
        Ok((path, report))
    }

    /// Replay a legacy trade-history file through the normal ingestion path.
    /// Clears the ledger and all derived state first. Returns
    /// (migrated, skipped).
    pub async fn migrate_legacy(&self, path: &Path) -> Result<(usize, usize)> {
        let content = tokio::fs::read_to_string(path).await?;
        let raw: Vec<serde_json::Value> = serde_json::from_str(&content).map_err(|e| {
            PaperbotError::DataIntegrity(format!(
                "legacy file {} is not a JSON array: {}",
                path.display(),
                e
            ))
        })?;

        info!(count = raw.len(), path = %path.display(), "Migrating legacy trades");

        self.ledger.clear().await?;
        self.positions.reset().await?;
        self.realized.reset().await?;
        self.analytics.reset().await?;

        let mut migrated = 0;
        let mut skipped = 0;
        for value in raw {
            let draft: TradeDraft = match serde_json::from_value(value) {
                Ok(draft) => draft,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable legacy trade");
                    skipped += 1;
                    continue;
                }
            };
            match self.record_trade(draft).await {
                Ok(_) => migrated += 1,
                Err(e) => {
                    warn!(error = %e, "Skipping invalid legacy trade");
                    skipped += 1;
                }
            }
        }

        info!(migrated, skipped, "Legacy trade migration complete");
        Ok((migrated, skipped))
    }

    // exclusion administration

    pub async fn exclude_asset(&self, asset: &str, reason: &str) -> Result<bool> {
        self.exclusions.add(&asset.trim().to_uppercase(), reason).await
    }

    pub async fn include_asset(&self, asset: &str) -> Result<bool> {
        self.exclusions.remove(&asset.trim().to_uppercase()).await
    }

    pub async fn list_exclusions(&self) -> Result<Vec<ExclusionEntry>> {
        self.exclusions.list().await
    }
}
