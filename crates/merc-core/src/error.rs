//! Error types for merc-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The inventory is private or otherwise unreadable. Decisions that
    /// depend on it must treat the outcome as indeterminate, never as
    /// a pass or a fail.
    #[error("Inventory is inaccessible (private)")]
    InventoryInaccessible,

    #[error("Unknown quality code: {0}")]
    UnknownQuality(u8),

    #[error("Duplicate catalog entry: defindex {0}")]
    DuplicateCatalogEntry(u32),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Catalog parse error: {0}")]
    CatalogParse(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
