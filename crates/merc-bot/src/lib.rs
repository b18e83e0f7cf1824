//! Item trading bot.
//!
//! Wires the domain crates together:
//! - catalog and order book loading (fail-fast at startup)
//! - file-backed inventory snapshots
//! - the trade manager and its single-session slot
//! - an order-management console

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod store;

pub use app::Application;
pub use commands::CommandContext;
pub use config::BotConfig;
pub use error::{BotError, BotResult};
pub use inventory::JsonInventoryProvider;
pub use logging::init_logging;
