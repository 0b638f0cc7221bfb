//! Atomic JSON document persistence shared by the durable stores
//!
//! Every durable collection is one JSON document. Writers load the current
//! document, apply the change and persist via write-to-temp + atomic rename,
//! all under the owning store's lock, so readers never observe a partially
//! written state. Lock acquisition is bounded; exceeding the wait surfaces a
//! retryable concurrency failure instead of blocking the caller forever.

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::{PaperbotError, Result};

/// Bounded wait for a store lock before reporting a concurrency failure.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);

pub async fn read_guard<'a>(lock: &'a RwLock<()>, what: &str) -> Result<RwLockReadGuard<'a, ()>> {
    tokio::time::timeout(LOCK_WAIT, lock.read())
        .await
        .map_err(|_| PaperbotError::Concurrency(format!("timed out waiting to read {}", what)))
}

pub async fn write_guard<'a>(lock: &'a RwLock<()>, what: &str) -> Result<RwLockWriteGuard<'a, ()>> {
    tokio::time::timeout(LOCK_WAIT, lock.write())
        .await
        .map_err(|_| PaperbotError::Concurrency(format!("timed out waiting to write {}", what)))
}

/// Load a JSON document, `None` if it does not exist yet.
pub async fn load_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map(Some).map_err(|e| {
        PaperbotError::DataIntegrity(format!("unreadable document {}: {}", path.display(), e))
    })
}

/// Persist a JSON document atomically (write to temp, rename into place).
pub async fn save_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        assert!(load_document::<Vec<u32>>(&path).await.unwrap().is_none());

        save_document(&path, &vec![1u32, 2, 3]).await.unwrap();
        let back: Vec<u32> = load_document(&path).await.unwrap().unwrap();
        assert_eq!(back, vec![1, 2, 3]);

        // no stray temp file left behind
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_unreadable_document_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let err = load_document::<Vec<u32>>(&path).await.unwrap_err();
        assert!(matches!(err, PaperbotError::DataIntegrity(_)));
    }
}
