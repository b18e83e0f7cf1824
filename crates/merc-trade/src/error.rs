//! Error types for merc-trade.

use thiserror::Error;

use merc_core::{CoreError, Currency};

use crate::transport::TransportError;

/// Trade subsystem errors.
#[derive(Debug, Error)]
pub enum TradeError {
    /// Only one trade session may be open at a time. The existing
    /// session is untouched when this is returned.
    #[error("A trade session is already open with user #{other_id}")]
    SessionAlreadyOpen { other_id: u64 },

    /// Inventory fetch failed while initializing a session. Distinct
    /// from other errors: it decides whether a session is created at
    /// all.
    #[error("Could not initialize trade inventories: {0}")]
    InventoryInit(String),

    /// The exact order price could not be assembled from available
    /// currency stock. Fatal to the session; a partial payment is
    /// never sent.
    #[error("Could not assemble exact payment: built {built} of {price}")]
    ExactChangeUnavailable { built: Currency, price: Currency },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for trade operations.
pub type Result<T> = std::result::Result<T, TradeError>;
