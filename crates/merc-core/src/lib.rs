//! Core domain types for the mercbot item-trading bot.
//!
//! This crate provides the fundamental types used throughout the bot:
//! - `Currency`: exact integer currency arithmetic (scrap ladder)
//! - `ItemInstance`, `DefIndex`, `Quality`: item identity and attributes
//! - `ItemCatalog`: read-only item-type catalog
//! - `InventorySnapshot`: immutable per-party inventory view

pub mod catalog;
pub mod currency;
pub mod error;
pub mod inventory;
pub mod item;

pub use catalog::{CatalogItem, ItemCatalog};
pub use currency::{Currency, CurrencyUnit};
pub use error::{CoreError, Result};
pub use inventory::InventorySnapshot;
pub use item::{DefIndex, ItemId, ItemInstance, Quality};
