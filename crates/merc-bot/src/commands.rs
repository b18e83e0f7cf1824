//! Order management commands.
//!
//! One entry point, `handle_command`, shared by the interactive console
//! and the friend-chat admin surface. Every reply is a plain line of
//! text; the caller decides where it goes.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info};

use merc_core::{Currency, DefIndex, ItemCatalog, Quality};
use merc_orders::{Order, OrderBook, OrderSide};

use crate::store;

const ORDERS_HELP: [&str; 6] = [
    "orders list",
    "orders add <buy|sell> <defindex> <quality> <price> [max_stock]",
    "orders set <buy|sell> <defindex> <quality> <price>",
    "orders remove <buy|sell> <defindex>",
    "orders help",
    "Quality is a name (unique, vintage, strange, ...) or a numeric code. Price is in refined, e.g. 2.33.",
];

/// Shared state the command surface operates on.
pub struct CommandContext {
    pub book: Arc<RwLock<OrderBook>>,
    pub catalog: Arc<ItemCatalog>,
    pub orders_path: String,
}

impl CommandContext {
    /// Dispatch one command line and return the reply lines.
    pub fn handle_command(&self, line: &str) -> Vec<String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["orders", rest @ ..] => self.handle_orders(rest),
            ["help"] => vec!["Commands: orders, help, quit".to_string()],
            [] => Vec::new(),
            _ => vec![format!("Unknown command: {line}. Try \"help\".")],
        }
    }

    fn handle_orders(&self, args: &[&str]) -> Vec<String> {
        match args {
            ["list"] => self.list(),
            ["add", side, defindex, quality, price] => {
                self.add(side, defindex, quality, price, None)
            }
            ["add", side, defindex, quality, price, max_stock] => {
                self.add(side, defindex, quality, price, Some(max_stock))
            }
            ["set", side, defindex, quality, price] => self.set(side, defindex, quality, price),
            ["remove", side, defindex] => self.remove(side, defindex),
            ["help"] | [] => ORDERS_HELP.iter().map(|s| (*s).to_string()).collect(),
            _ => vec!["Unrecognized orders command. Try \"orders help\".".to_string()],
        }
    }

    fn list(&self) -> Vec<String> {
        let book = self.book.read();
        let lines: Vec<String> = book
            .all_orders()
            .map(|order| order.describe(&self.catalog))
            .collect();
        if lines.is_empty() {
            vec!["No orders.".to_string()]
        } else {
            lines
        }
    }

    fn add(
        &self,
        side: &str,
        defindex: &str,
        quality: &str,
        price: &str,
        max_stock: Option<&str>,
    ) -> Vec<String> {
        let (side, defindex, quality, price) =
            match parse_order_args(side, defindex, quality, price) {
                Ok(parsed) => parsed,
                Err(reply) => return vec![reply],
            };

        let mut order = Order::new(side, defindex, quality, price);
        if let Some(raw) = max_stock {
            match raw.parse::<u32>() {
                Ok(cap) => order.max_stock = Some(cap),
                Err(_) => return vec![format!("Invalid max stock: {raw}")],
            }
        }

        let described = order.describe(&self.catalog);
        let result = self.book.write().insert(order);
        match result {
            Ok(()) => {
                info!(%defindex, %side, "order added");
                self.persist(format!("Added: {described}"))
            }
            Err(err) => vec![err.to_string()],
        }
    }

    fn set(&self, side: &str, defindex: &str, quality: &str, price: &str) -> Vec<String> {
        let (side, defindex, quality, price) =
            match parse_order_args(side, defindex, quality, price) {
                Ok(parsed) => parsed,
                Err(reply) => return vec![reply],
            };

        let result = self.book.write().set_price(side, defindex, quality, price);
        match result {
            Ok(()) => {
                info!(%defindex, %side, new_price = %price, "order re-priced");
                self.persist(format!(
                    "Updated {side} order for {} to {}.",
                    self.catalog.name_of(defindex),
                    price.to_ref_string()
                ))
            }
            Err(err) => vec![err.to_string()],
        }
    }

    fn remove(&self, side: &str, defindex: &str) -> Vec<String> {
        let Some(side) = parse_side(side) else {
            return vec![format!("Invalid side: {side} (expected buy or sell)")];
        };
        let Ok(idx) = defindex.parse::<u32>() else {
            return vec![format!("Invalid defindex: {defindex}")];
        };

        let result = self.book.write().remove(side, DefIndex(idx));
        match result {
            Ok(order) => {
                info!(defindex = idx, %side, "order removed");
                self.persist(format!("Removed: {}", order.describe(&self.catalog)))
            }
            Err(err) => vec![err.to_string()],
        }
    }

    /// Write the book back to disk, reporting a failure without losing
    /// the in-memory change.
    fn persist(&self, ok_reply: String) -> Vec<String> {
        let book = self.book.read();
        match store::save_orders(&self.orders_path, &book) {
            Ok(()) => vec![ok_reply],
            Err(err) => {
                error!(error = %err, path = %self.orders_path, "failed to persist orders");
                vec![
                    ok_reply,
                    format!("Warning: could not save orders to disk: {err}"),
                ]
            }
        }
    }
}

fn parse_side(raw: &str) -> Option<OrderSide> {
    match raw.to_ascii_lowercase().as_str() {
        "buy" => Some(OrderSide::Buy),
        "sell" => Some(OrderSide::Sell),
        _ => None,
    }
}

fn parse_quality(raw: &str) -> Option<Quality> {
    if let Ok(code) = raw.parse::<u8>() {
        return Quality::try_from(code).ok();
    }
    match raw.to_ascii_lowercase().as_str() {
        "stock" => Some(Quality::Stock),
        "genuine" => Some(Quality::Genuine),
        "vintage" => Some(Quality::Vintage),
        "unusual" => Some(Quality::Unusual),
        "unique" => Some(Quality::Unique),
        "community" => Some(Quality::Community),
        "valve" => Some(Quality::Valve),
        "selfmade" | "self-made" => Some(Quality::SelfMade),
        "strange" => Some(Quality::Strange),
        "haunted" => Some(Quality::Haunted),
        "collectors" | "collector's" => Some(Quality::Collectors),
        _ => None,
    }
}

fn parse_order_args(
    side: &str,
    defindex: &str,
    quality: &str,
    price: &str,
) -> Result<(OrderSide, DefIndex, Quality, Currency), String> {
    let side = parse_side(side).ok_or_else(|| format!("Invalid side: {side} (expected buy or sell)"))?;
    let defindex = defindex
        .parse::<u32>()
        .map(DefIndex)
        .map_err(|_| format!("Invalid defindex: {defindex}"))?;
    let quality =
        parse_quality(quality).ok_or_else(|| format!("Invalid quality: {quality}"))?;
    let price =
        Currency::parse_ref(price).map_err(|_| format!("Invalid price: {price}"))?;
    Ok((side, defindex, quality, price))
}
