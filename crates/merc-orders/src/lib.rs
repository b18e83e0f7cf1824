//! Order book and matching for the mercbot trading bot.
//!
//! Provides:
//! - `Order`: a standing rule to buy or sell one item type
//! - `OrderBook`: buy/sell lists with duplicate detection
//! - `MatchOutcome`: matched / not-matched / indeterminate evaluation

pub mod book;
pub mod order;

pub use book::{MatchOutcome, OrderBook, OrderBookError};
pub use order::{Order, OrderSide};
