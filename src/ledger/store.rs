//! Durable trade ledger backed by a single JSON array document

use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::data_paths::DataPaths;
use crate::errors::{PaperbotError, Result};
use crate::ledger::types::Trade;
use crate::persist;

/// Append-only, time-ordered store of executed trades.
///
/// Writes are serialized through one coarse lock (read current document,
/// append, persist atomically); once `append` returns the write is durable.
pub struct TradeLedger {
    path: PathBuf,
    lock: RwLock<()>,
}

impl TradeLedger {
    pub fn new(data_paths: &DataPaths) -> Self {
        Self {
            path: data_paths.ledger().join("trades.json"),
            lock: RwLock::new(()),
        }
    }

    /// Append a trade. Durable once this returns.
    pub async fn append(&self, trade: &Trade) -> Result<String> {
        let _guard = persist::write_guard(&self.lock, "trade ledger").await?;

        let mut trades = self.load_records().await?;
        trades.push(trade.clone());
        persist::save_document(&self.path, &trades).await?;

        debug!(trade_id = %trade.id, symbol = %trade.symbol, "Appended trade to ledger");
        Ok(trade.id.clone())
    }

    /// All recorded trades, ascending by timestamp.
    pub async fn all(&self) -> Result<Vec<Trade>> {
        let _guard = persist::read_guard(&self.lock, "trade ledger").await?;

        let mut trades = self.load_records().await?;
        trades.sort_by_key(|t| t.timestamp);
        Ok(trades)
    }

    /// Trades with `start_ts <= timestamp <= end_ts`, ascending by timestamp.
    pub async fn query(&self, start_ts: i64, end_ts: i64) -> Result<Vec<Trade>> {
        if start_ts >= end_ts {
            return Err(PaperbotError::Validation(format!(
                "invalid time range: start {} must be before end {}",
                start_ts, end_ts
            )));
        }

        let trades = self.all().await?;
        Ok(trades
            .into_iter()
            .filter(|t| t.timestamp >= start_ts && t.timestamp <= end_ts)
            .collect())
    }

    /// Drop every record. Only the legacy-migration path uses this.
    pub async fn clear(&self) -> Result<()> {
        let _guard = persist::write_guard(&self.lock, "trade ledger").await?;
        persist::save_document(&self.path, &Vec::<Trade>::new()).await
    }

    /// Load the backing document, skipping records that fail the canonical
    /// schema rather than failing the whole read.
    async fn load_records(&self) -> Result<Vec<Trade>> {
        let raw: Vec<serde_json::Value> =
            match persist::load_document(&self.path).await? {
                Some(values) => values,
                None => return Ok(Vec::new()),
            };

        let mut trades = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<Trade>(value) {
                Ok(trade) => trades.push(trade),
                Err(e) => warn!(error = %e, "Skipping malformed trade record in ledger"),
            }
        }
        Ok(trades)
    }
}
