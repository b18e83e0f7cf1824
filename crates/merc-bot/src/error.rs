//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] merc_core::CoreError),

    #[error("Order book error: {0}")]
    Orders(#[from] merc_orders::OrderBookError),

    #[error("Trade error: {0}")]
    Trade(#[from] merc_trade::TradeError),

    #[error("Order store error: {0}")]
    Store(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BotResult<T> = Result<T, BotError>;
