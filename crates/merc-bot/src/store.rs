//! Order book persistence.
//!
//! The book is stored as a small JSON document with separate buy and
//! sell lists, rewritten in full after every change. A missing file is
//! an empty book, not an error, so a fresh deployment starts clean.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use merc_orders::{Order, OrderBook};

use crate::error::BotResult;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedOrders {
    #[serde(default)]
    buy: Vec<Order>,
    #[serde(default)]
    sell: Vec<Order>,
}

/// Load the order book, or an empty one if the file does not exist.
pub fn load_orders(path: &str) -> BotResult<OrderBook> {
    if !Path::new(path).exists() {
        warn!(path, "order file not found, starting with an empty book");
        return Ok(OrderBook::new());
    }
    let content = std::fs::read_to_string(path)?;
    let persisted: PersistedOrders = serde_json::from_str(&content)?;
    info!(
        path,
        buys = persisted.buy.len(),
        sells = persisted.sell.len(),
        "orders loaded"
    );
    Ok(OrderBook::from_orders(persisted.buy, persisted.sell))
}

/// Write the whole book back to disk.
pub fn save_orders(path: &str, book: &OrderBook) -> BotResult<()> {
    let persisted = PersistedOrders {
        buy: book.buy_orders().to_vec(),
        sell: book.sell_orders().to_vec(),
    };
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(&persisted)?)?;
    Ok(())
}
