//! File-backed inventory snapshots.
//!
//! Serves inventory fetches from per-account JSON files under a
//! configured directory, one `<account_id>.json` each. A missing or
//! unreadable file is a fetch failure (the session is then refused); a
//! file marked private loads as a private snapshot and flows through
//! the indeterminate/fail-safe paths instead.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use merc_core::{InventorySnapshot, ItemInstance};
use merc_trade::{BoxFuture, InventoryProvider, TransportError};

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    private: bool,
    #[serde(default)]
    items: Vec<ItemInstance>,
}

/// Inventory provider reading snapshots from disk.
pub struct JsonInventoryProvider {
    dir: PathBuf,
}

impl JsonInventoryProvider {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl InventoryProvider for JsonInventoryProvider {
    fn fetch(&self, user_id: u64) -> BoxFuture<'_, Result<InventorySnapshot, TransportError>> {
        let path = self.dir.join(format!("{user_id}.json"));
        Box::pin(async move {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| TransportError::new(format!("read {}: {e}", path.display())))?;
            let file: SnapshotFile = serde_json::from_str(&content)
                .map_err(|e| TransportError::new(format!("parse {}: {e}", path.display())))?;

            if file.private {
                debug!(user_id, "inventory marked private");
                Ok(InventorySnapshot::private())
            } else {
                debug!(user_id, items = file.items.len(), "inventory loaded");
                Ok(InventorySnapshot::accessible(file.items))
            }
        })
    }
}
