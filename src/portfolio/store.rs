//! Durable portfolio collections: positions, realized-PnL log, analytics snapshot

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::warn;

use crate::data_paths::DataPaths;
use crate::errors::Result;
use crate::persist;
use crate::portfolio::types::{AnalyticsReport, Position, RealizedPnlEntry};

/// Positions keyed by asset, persisted as one JSON map document.
///
/// Mutations run as read-modify-write-persist under the write lock; reads
/// take the read lock and always see a complete document.
pub struct PositionStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl PositionStore {
    pub fn new(data_paths: &DataPaths) -> Self {
        Self {
            path: data_paths.portfolio().join("positions.json"),
            lock: RwLock::new(()),
        }
    }

    pub async fn load(&self) -> Result<HashMap<String, Position>> {
        let _guard = persist::read_guard(&self.lock, "position store").await?;
        self.load_map().await
    }

    /// Read-modify-write-persist under the store lock.
    pub async fn mutate<F, T>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut HashMap<String, Position>) -> T,
    {
        let _guard = persist::write_guard(&self.lock, "position store").await?;

        let mut positions = self.load_map().await?;
        let outcome = apply(&mut positions);
        persist::save_document(&self.path, &positions).await?;
        Ok(outcome)
    }

    pub async fn reset(&self) -> Result<()> {
        let _guard = persist::write_guard(&self.lock, "position store").await?;
        persist::save_document(&self.path, &HashMap::<String, Position>::new()).await
    }

    async fn load_map(&self) -> Result<HashMap<String, Position>> {
        let raw: HashMap<String, serde_json::Value> =
            match persist::load_document(&self.path).await? {
                Some(map) => map,
                None => return Ok(HashMap::new()),
            };

        let mut positions = HashMap::with_capacity(raw.len());
        for (asset, value) in raw {
            match serde_json::from_value::<Position>(value) {
                Ok(position) => {
                    positions.insert(asset, position);
                }
                Err(e) => warn!(asset = %asset, error = %e, "Skipping malformed position record"),
            }
        }
        Ok(positions)
    }
}

/// Append-only log of realized-PnL entries, one per processed sell.
pub struct RealizedPnlLog {
    path: PathBuf,
    lock: RwLock<()>,
}

impl RealizedPnlLog {
    pub fn new(data_paths: &DataPaths) -> Self {
        Self {
            path: data_paths.portfolio().join("realized_pnl.json"),
            lock: RwLock::new(()),
        }
    }

    pub async fn append(&self, entry: &RealizedPnlEntry) -> Result<()> {
        let _guard = persist::write_guard(&self.lock, "realized PnL log").await?;

        let mut entries: Vec<RealizedPnlEntry> = persist::load_document(&self.path)
            .await?
            .unwrap_or_default();
        entries.push(entry.clone());
        persist::save_document(&self.path, &entries).await
    }

    pub async fn all(&self) -> Result<Vec<RealizedPnlEntry>> {
        let _guard = persist::read_guard(&self.lock, "realized PnL log").await?;
        Ok(persist::load_document(&self.path).await?.unwrap_or_default())
    }

    pub async fn reset(&self) -> Result<()> {
        let _guard = persist::write_guard(&self.lock, "realized PnL log").await?;
        persist::save_document(&self.path, &Vec::<RealizedPnlEntry>::new()).await
    }
}

/// Precomputed analytics snapshot, overwritten on every recompute.
pub struct AnalyticsStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl AnalyticsStore {
    pub fn new(data_paths: &DataPaths) -> Self {
        Self {
            path: data_paths.portfolio().join("analytics.json"),
            lock: RwLock::new(()),
        }
    }

    pub async fn save(&self, report: &AnalyticsReport) -> Result<()> {
        let _guard = persist::write_guard(&self.lock, "analytics snapshot").await?;
        persist::save_document(&self.path, report).await
    }

    pub async fn load(&self) -> Result<Option<AnalyticsReport>> {
        let _guard = persist::read_guard(&self.lock, "analytics snapshot").await?;
        persist::load_document(&self.path).await
    }

    pub async fn reset(&self) -> Result<()> {
        let _guard = persist::write_guard(&self.lock, "analytics snapshot").await?;
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn position(asset: &str, free: Decimal) -> Position {
        Position {
            asset: asset.to_string(),
            free_qty: free,
            locked_qty: Decimal::ZERO,
            avg_cost: dec!(100),
            total_invested: free * dec!(100),
            current_price: dec!(100),
            unrealized_pnl: Decimal::ZERO,
            unrealized_pnl_percent: Decimal::ZERO,
            last_updated: 0,
        }
    }

    #[tokio::test]
    async fn test_mutate_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());

        let store = PositionStore::new(&paths);
        store
            .mutate(|map| {
                map.insert("ETH".to_string(), position("ETH", dec!(2)));
            })
            .await
            .unwrap();

        // a fresh handle reads the same state back from disk
        let reopened = PositionStore::new(&paths);
        let loaded = reopened.load().await.unwrap();
        assert_eq!(loaded["ETH"].free_qty, dec!(2));
    }

    #[tokio::test]
    async fn test_malformed_position_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let store = PositionStore::new(&paths);

        let doc = serde_json::json!({
            "ETH": serde_json::to_value(position("ETH", dec!(1))).unwrap(),
            "BAD": {"asset": "BAD"}
        });
        persist::save_document(&store.path, &doc).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("ETH"));
    }

    #[tokio::test]
    async fn test_realized_log_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let log = RealizedPnlLog::new(&paths);

        for (i, pnl) in [dec!(10), dec!(-3)].iter().enumerate() {
            log.append(&RealizedPnlEntry {
                asset: "ETH".to_string(),
                trade_id: format!("t{}", i),
                symbol: "ETHUSDT".to_string(),
                quantity: dec!(1),
                sell_price: dec!(100),
                realized_pnl: *pnl,
                timestamp: i as i64,
            })
            .await
            .unwrap();
        }

        let entries = log.all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].realized_pnl, dec!(10));
        assert_eq!(entries[1].realized_pnl, dec!(-3));
    }
}
