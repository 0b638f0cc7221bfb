//! End-to-end accounting scenarios over a temporary data directory

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use paperbot::config::Settings;
use paperbot::data_paths::DataPaths;
use paperbot::errors::PaperbotError;
use paperbot::exchange::{AssetBalance, ExchangeDataSource, ExchangeError};
use paperbot::ledger::{TradeDraft, TradeLedger, TradeSide};
use paperbot::portfolio::{HistoryFilter, PortfolioService};

/// Test double for the exchange: fixed prices and balances, mutable mid-test.
struct StubExchange {
    prices: Mutex<HashMap<String, Decimal>>,
    balances: Mutex<Vec<AssetBalance>>,
}

impl StubExchange {
    fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
            balances: Mutex::new(Vec::new()),
        }
    }

    async fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.lock().await.insert(symbol.to_string(), price);
    }

    async fn set_balances(&self, balances: Vec<AssetBalance>) {
        *self.balances.lock().await = balances;
    }
}

#[async_trait]
impl ExchangeDataSource for StubExchange {
    async fn current_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        self.prices
            .lock()
            .await
            .get(symbol)
            .copied()
            .ok_or(ExchangeError::Api {
                status: 400,
                body: format!("unknown symbol {}", symbol),
            })
    }

    async fn account_balances(&self) -> Result<Vec<AssetBalance>, ExchangeError> {
        Ok(self.balances.lock().await.clone())
    }
}

fn draft(symbol: &str, side: &str, qty: Decimal, price: Decimal, ts: i64) -> TradeDraft {
    TradeDraft {
        symbol: symbol.to_string(),
        side: side.to_string(),
        quantity: qty,
        price,
        quote_qty: None,
        commission: Decimal::ZERO,
        commission_asset: None,
        timestamp: ts,
        order_type: None,
        exchange_order_id: None,
    }
}

fn service_with(
    dir: &tempfile::TempDir,
) -> (PortfolioService, Arc<StubExchange>, DataPaths) {
    let paths = DataPaths::new(dir.path());
    paths.ensure_directories().unwrap();
    let exchange = Arc::new(StubExchange::new());
    let service = PortfolioService::new(Settings::default(), paths.clone(), exchange.clone());
    (service, exchange, paths)
}

#[tokio::test]
async fn buy_then_sell_realizes_pnl_and_closes_position() {
    let dir = tempfile::tempdir().unwrap();
    let (service, exchange, _paths) = service_with(&dir);
    exchange.set_price("ETHUSDT", dec!(2100)).await;

    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(2000), 1_000))
        .await
        .unwrap();
    service
        .record_trade(draft("ETHUSDT", "SELL", dec!(1), dec!(2100), 2_000))
        .await
        .unwrap();

    // the position is fully closed and absent from views
    let positions = service.get_positions().await.unwrap();
    assert!(!positions.contains_key("ETH"));

    // lifetime realized PnL comes from the per-sell log
    let analytics = service.get_analytics().await.unwrap();
    assert_eq!(analytics.total_realized_pnl, dec!(100));
}

#[tokio::test]
async fn averaging_in_keeps_cost_basis_on_sale() {
    let dir = tempfile::tempdir().unwrap();
    let (service, exchange, _paths) = service_with(&dir);
    exchange.set_price("ETHUSDT", dec!(160)).await;

    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(100), 1_000))
        .await
        .unwrap();
    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(200), 2_000))
        .await
        .unwrap();
    service
        .record_trade(draft("ETHUSDT", "SELL", dec!(1), dec!(180), 3_000))
        .await
        .unwrap();

    let positions = service.get_positions().await.unwrap();
    let eth = &positions["ETH"];
    assert_eq!(eth.avg_cost, dec!(150));
    assert_eq!(eth.total_quantity(), dec!(1));
    // marked to the stub price
    assert_eq!(eth.current_price, dec!(160));
    assert_eq!(eth.unrealized_pnl, dec!(10));
}

#[tokio::test]
async fn ledger_round_trip_through_record_trade() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _exchange, paths) = service_with(&dir);

    let id = service
        .record_trade(draft("ETHUSDT", "BUY", dec!(2), dec!(1500), 5_000))
        .await
        .unwrap();

    let ledger = TradeLedger::new(&paths);
    let in_range = ledger.query(1_000, 10_000).await.unwrap();
    assert_eq!(in_range.len(), 1);
    assert_eq!(in_range[0].id, id);
    assert_eq!(in_range[0].quantity, dec!(2));
    assert_eq!(in_range[0].quote_qty, dec!(3000));

    let outside = ledger.query(10_001, 20_000).await.unwrap();
    assert!(outside.is_empty());
}

#[tokio::test]
async fn pnl_report_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (service, exchange, _paths) = service_with(&dir);
    exchange.set_price("ETHUSDT", dec!(2500)).await;

    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(2), dec!(2000), 1_000))
        .await
        .unwrap();
    service
        .record_trade(draft("ETHUSDT", "SELL", dec!(1), dec!(2400), 2_000))
        .await
        .unwrap();

    let first = service.get_pnl(0, 10_000).await.unwrap();
    let second = service.get_pnl(0, 10_000).await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn pnl_rejects_inverted_range() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _exchange, _paths) = service_with(&dir);

    let err = service.get_pnl(10_000, 1_000).await.unwrap_err();
    assert!(matches!(err, PaperbotError::Validation(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn excluded_assets_vanish_from_views() {
    let dir = tempfile::tempdir().unwrap();
    let (service, exchange, _paths) = service_with(&dir);
    exchange.set_price("XYZUSDT", dec!(5)).await;

    service
        .record_trade(draft("XYZUSDT", "BUY", dec!(100), dec!(4), 1_000))
        .await
        .unwrap();

    assert!(service.get_positions().await.unwrap().contains_key("XYZ"));

    assert!(service.exclude_asset("XYZ", "delisted pair").await.unwrap());
    // idempotent
    assert!(!service.exclude_asset("XYZ", "again").await.unwrap());

    assert!(!service.get_positions().await.unwrap().contains_key("XYZ"));
    assert!(service
        .get_balances()
        .await
        .unwrap()
        .iter()
        .all(|row| row.asset != "XYZ"));

    // explicit removal brings it back
    assert!(service.include_asset("XYZ").await.unwrap());
    assert!(service.get_positions().await.unwrap().contains_key("XYZ"));
}

#[tokio::test]
async fn price_failure_degrades_views_not_requests() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _exchange, _paths) = service_with(&dir);

    // no price configured for ETHUSDT at all
    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(2000), 1_000))
        .await
        .unwrap();

    // positions view keeps the previous snapshot (entry price)
    let positions = service.get_positions().await.unwrap();
    assert_eq!(positions["ETH"].current_price, dec!(2000));

    // PnL report marks the asset degraded instead of failing
    let report = service.get_pnl(0, 10_000).await.unwrap();
    assert_eq!(report.degraded_assets, vec!["ETH".to_string()]);
    assert_eq!(report.assets["ETH"].unrealized_pnl, Decimal::ZERO);
}

#[tokio::test]
async fn history_filters_and_pages_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _exchange, _paths) = service_with(&dir);

    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(100), 1_000))
        .await
        .unwrap();
    service
        .record_trade(draft("BTCUSDT", "BUY", dec!(1), dec!(200), 2_000))
        .await
        .unwrap();
    service
        .record_trade(draft("ETHUSDT", "SELL", dec!(1), dec!(150), 3_000))
        .await
        .unwrap();

    let eth_only = service
        .get_trade_history(HistoryFilter {
            symbol: Some("eth/usdt".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(eth_only.len(), 2);
    assert_eq!(eth_only[0].timestamp, 3_000);

    let sells = service
        .get_trade_history(HistoryFilter {
            side: Some(TradeSide::Sell),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sells.len(), 1);

    let page = service
        .get_trade_history(HistoryFilter {
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].timestamp, 2_000);
}

#[tokio::test]
async fn reconcile_overwrites_seeds_and_drops() {
    let dir = tempfile::tempdir().unwrap();
    let (service, exchange, _paths) = service_with(&dir);
    exchange.set_price("ETHUSDT", dec!(2000)).await;
    exchange.set_price("SOLUSDT", dec!(150)).await;

    // tracked: ETH (stays, quantity drifts) and DOGE (exchange stopped reporting it)
    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(1800), 1_000))
        .await
        .unwrap();
    service
        .record_trade(draft("DOGEUSDT", "BUY", dec!(1000), dec!(0.1), 2_000))
        .await
        .unwrap();

    exchange
        .set_balances(vec![
            AssetBalance {
                asset: "ETH".to_string(),
                free: dec!(0.75),
                locked: dec!(0.25),
            },
            AssetBalance {
                asset: "SOL".to_string(),
                free: dec!(10),
                locked: Decimal::ZERO,
            },
            AssetBalance {
                asset: "USDT".to_string(),
                free: dec!(500),
                locked: Decimal::ZERO,
            },
        ])
        .await;

    let summary = service.reconcile_with_exchange().await.unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.removed, 1);

    let positions = service.get_positions().await.unwrap();

    // ETH quantities overwritten with ground truth, cost basis untouched
    let eth = &positions["ETH"];
    assert_eq!(eth.free_qty, dec!(0.75));
    assert_eq!(eth.locked_qty, dec!(0.25));
    assert_eq!(eth.avg_cost, dec!(1800));

    // SOL seeded at the current price
    let sol = &positions["SOL"];
    assert_eq!(sol.avg_cost, dec!(150));
    assert_eq!(sol.total_invested, dec!(1500));

    // DOGE no longer reported by the exchange
    assert!(!positions.contains_key("DOGE"));

    // the quote currency itself is never tracked as a position
    assert!(!positions.contains_key("USDT"));
    assert_eq!(service.get_quote_balance().await.unwrap(), dec!(500));
}

#[tokio::test]
async fn fifo_variant_disagrees_with_average_cost_on_mixed_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _exchange, _paths) = service_with(&dir);

    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(100), 1_000))
        .await
        .unwrap();
    service
        .record_trade(draft("ETHUSDT", "BUY", dec!(1), dec!(200), 2_000))
        .await
        .unwrap();
    service
        .record_trade(draft("ETHUSDT", "SELL", dec!(1), dec!(180), 3_000))
        .await
        .unwrap();

    // canonical model realized (180 - 150) = 30
    let analytics = service.get_analytics().await.unwrap();
    assert_eq!(analytics.total_realized_pnl, dec!(30));

    // FIFO matches the oldest lot: (180 - 100) = 80
    let fifo = service.get_pnl_fifo().await.unwrap();
    assert_eq!(fifo.realized_pnl, dec!(80));
}

#[tokio::test]
async fn migration_replays_legacy_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let (service, exchange, paths) = service_with(&dir);
    exchange.set_price("ETHUSDT", dec!(2100)).await;

    let legacy = serde_json::json!([
        {
            "symbol": "ETHUSDT",
            "side": "BUY",
            "quantity": 1.0,
            "price": 2000.0,
            "quoteQty": 2000.0,
            "commission": 0.0,
            "commissionAsset": "USDT",
            "time": 1_000,
            "orderType": "MARKET",
            "tradeId": 7
        },
        {"symbol": "BROKEN"},
        {
            "symbol": "ETHUSDT",
            "side": "SELL",
            "qty": 0.5,
            "price": 2200.0,
            "time": 2_000
        }
    ]);
    let legacy_path = paths.root().join("trade_history.json");
    std::fs::write(&legacy_path, serde_json::to_string(&legacy).unwrap()).unwrap();

    let (migrated, skipped) = service.migrate_legacy(&legacy_path).await.unwrap();
    assert_eq!(migrated, 2);
    assert_eq!(skipped, 1);

    let positions = service.get_positions().await.unwrap();
    assert_eq!(positions["ETH"].total_quantity(), dec!(0.5));
    assert_eq!(positions["ETH"].avg_cost, dec!(2000));

    let analytics = service.get_analytics().await.unwrap();
    assert_eq!(analytics.total_realized_pnl, dec!(100));
    assert_eq!(analytics.trading_stats.total_trades, 2);
}

#[tokio::test]
async fn untracked_sell_is_logged_at_zero_pnl() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _exchange, _paths) = service_with(&dir);

    service
        .record_trade(draft("XRPUSDT", "SELL", dec!(10), dec!(2), 1_000))
        .await
        .unwrap();

    let analytics = service.get_analytics().await.unwrap();
    assert_eq!(analytics.total_realized_pnl, Decimal::ZERO);
    assert!(service.get_positions().await.unwrap().is_empty());
}
