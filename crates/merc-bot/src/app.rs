//! Application wiring and the management console.
//!
//! Startup is fail-fast: catalog and order book load before anything
//! else, and a broken catalog aborts the process. Afterwards the
//! application runs a line-oriented console for order management while
//! the trade manager supervises at most one live session at a time.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::io::AsyncBufReadExt;
use tracing::info;

use merc_core::ItemCatalog;
use merc_trade::{DynInventoryProvider, OrderHandler, TradeManager};

use crate::commands::CommandContext;
use crate::config::BotConfig;
use crate::error::{BotError, BotResult};
use crate::inventory::JsonInventoryProvider;
use crate::store;

/// Main application.
pub struct Application {
    config: BotConfig,
    commands: CommandContext,
    manager: Arc<TradeManager>,
}

impl Application {
    /// Wire all components from configuration.
    pub fn new(config: BotConfig) -> BotResult<Self> {
        let catalog_json = std::fs::read_to_string(&config.catalog_path).map_err(|e| {
            BotError::Config(format!(
                "failed to read catalog {}: {e}",
                config.catalog_path
            ))
        })?;
        let catalog = Arc::new(ItemCatalog::from_json(&catalog_json)?);
        info!(items = catalog.len(), path = %config.catalog_path, "catalog loaded");

        let book = Arc::new(RwLock::new(store::load_orders(&config.orders_path)?));
        let handler = Arc::new(OrderHandler::new(Arc::clone(&catalog), Arc::clone(&book)));
        let inventories: DynInventoryProvider =
            Arc::new(JsonInventoryProvider::new(config.inventories_dir.clone()));
        let manager = Arc::new(TradeManager::new(
            config.own_id,
            config.trading,
            handler,
            inventories,
        ));

        let commands = CommandContext {
            book,
            catalog,
            orders_path: config.orders_path.clone(),
        };

        Ok(Self {
            config,
            commands,
            manager,
        })
    }

    /// The trade manager, for the connection layer to open sessions on.
    #[must_use]
    pub fn manager(&self) -> &Arc<TradeManager> {
        &self.manager
    }

    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run the management console until EOF, `quit`, or Ctrl-C.
    pub async fn run(&self) -> BotResult<()> {
        info!(own_id = self.config.own_id, "management console ready, type \"help\"");

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, shutting down");
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    let line = line.trim();
                    if line == "quit" || line == "exit" {
                        break;
                    }
                    for reply in self.commands.handle_command(line) {
                        println!("{reply}");
                    }
                }
            }
        }

        // Abort any session still open so the other side is not left
        // staring at a dead window.
        self.manager.cancel_open_session();
        Ok(())
    }
}
