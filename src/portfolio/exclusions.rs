//! Exclusion registry: assets hidden from balance/portfolio views
//!
//! Typically populated when an asset cannot currently be liquidated. Entries
//! never expire on their own; removal is an explicit administrative call.
//! Consumers filter excluded assets at the view layer; the underlying
//! tracked state keeps accruing while hidden.

use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::info;

use crate::data_paths::DataPaths;
use crate::errors::Result;
use crate::persist;
use crate::portfolio::types::ExclusionEntry;
use crate::timeutil;

pub struct ExclusionRegistry {
    path: PathBuf,
    lock: RwLock<()>,
}

impl ExclusionRegistry {
    pub fn new(data_paths: &DataPaths) -> Self {
        Self {
            path: data_paths.portfolio().join("exclusions.json"),
            lock: RwLock::new(()),
        }
    }

    /// Add an asset to the registry. Idempotent: returns false if it was
    /// already present (the original entry and reason are kept).
    pub async fn add(&self, asset: &str, reason: &str) -> Result<bool> {
        let _guard = persist::write_guard(&self.lock, "exclusion registry").await?;

        let mut entries = self.load_entries().await?;
        if entries.iter().any(|e| e.asset == asset) {
            return Ok(false);
        }

        entries.push(ExclusionEntry {
            asset: asset.to_string(),
            reason: reason.to_string(),
            added_at: timeutil::now_ms(),
        });
        persist::save_document(&self.path, &entries).await?;

        info!(asset = %asset, reason = %reason, "Added asset to exclusion registry");
        Ok(true)
    }

    /// Remove an asset. Returns false if it was not excluded.
    pub async fn remove(&self, asset: &str) -> Result<bool> {
        let _guard = persist::write_guard(&self.lock, "exclusion registry").await?;

        let mut entries = self.load_entries().await?;
        let before = entries.len();
        entries.retain(|e| e.asset != asset);

        if entries.len() == before {
            return Ok(false);
        }

        persist::save_document(&self.path, &entries).await?;
        info!(asset = %asset, "Removed asset from exclusion registry");
        Ok(true)
    }

    pub async fn contains(&self, asset: &str) -> Result<bool> {
        Ok(self.asset_set().await?.contains(asset))
    }

    pub async fn list(&self) -> Result<Vec<ExclusionEntry>> {
        let _guard = persist::read_guard(&self.lock, "exclusion registry").await?;
        self.load_entries().await
    }

    /// Excluded asset names, for view-layer filtering.
    pub async fn asset_set(&self) -> Result<HashSet<String>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|e| e.asset)
            .collect())
    }

    async fn load_entries(&self) -> Result<Vec<ExclusionEntry>> {
        Ok(persist::load_document(&self.path).await?.unwrap_or_default())
    }
}
