//! Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use merc_trade::TradeTimingConfig;

use crate::error::{BotError, BotResult};

fn default_catalog_path() -> String {
    "data/catalog.json".to_string()
}

fn default_orders_path() -> String {
    "data/orders.json".to_string()
}

fn default_inventories_dir() -> String {
    "data/inventories".to_string()
}

/// Top-level bot configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// The bot's own account id.
    pub own_id: u64,

    /// Display name used in greetings and logs.
    #[serde(default)]
    pub display_name: String,

    /// Account ids allowed to manage orders.
    #[serde(default)]
    pub admins: Vec<u64>,

    /// Account ids whose accepts bypass the validation gate. Admins are
    /// implicitly trusted.
    #[serde(default)]
    pub trusted: Vec<u64>,

    /// Item catalog file (defindex -> name).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Persisted order book.
    #[serde(default = "default_orders_path")]
    pub orders_path: String,

    /// Directory of per-account inventory snapshot files.
    #[serde(default = "default_inventories_dir")]
    pub inventories_dir: String,

    /// Trade timing limits.
    #[serde(default)]
    pub trading: TradeTimingConfig,
}

impl BotConfig {
    /// Load configuration, falling back to `MERC_CONFIG` and then the
    /// default path.
    pub fn load() -> BotResult<Self> {
        let config_path =
            std::env::var("MERC_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> BotResult<Self> {
        if !Path::new(path).exists() {
            return Err(BotError::Config(format!("config file not found: {path}")));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("failed to read config: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| BotError::Config(format!("failed to parse config: {e}")))
    }

    /// Whether an account may manage orders.
    #[must_use]
    pub fn is_admin(&self, id: u64) -> bool {
        self.admins.contains(&id)
    }

    /// Whether an account's accepts bypass validation.
    #[must_use]
    pub fn is_trusted(&self, id: u64) -> bool {
        self.trusted.contains(&id) || self.is_admin(id)
    }
}
