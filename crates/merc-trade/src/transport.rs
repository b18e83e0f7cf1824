//! Transport abstraction for a live trade window.
//!
//! The network layer (session establishment, authentication, the trade
//! web API) is an external collaborator. The trading core talks to it
//! through `TradeTransport`: polled inbound `TradeEvent`s and a small
//! set of outbound calls. The trait is dyn-compatible via boxed
//! futures so tests can drive the core with a scripted fake.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use merc_core::{InventorySnapshot, ItemId, ItemInstance};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Transport-level failure. Individual poll failures are tolerated;
/// repeated ones close the session.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Which side of the trade window an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    /// The bot itself.
    Bot,
    /// The other participant.
    Other,
}

/// Why the remote end reports the trade window closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteClose {
    /// Both sides accepted; the exchange completed.
    Completed,
    /// Cancelled by either side.
    Cancelled,
    /// The exchange is on hold until an email confirmation.
    AwaitingEmailConfirmation,
}

/// Incremental event polled from the trade window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeEvent {
    ItemAdded { party: Party, item: ItemInstance },
    ItemRemoved { party: Party, item: ItemInstance },
    ReadyChanged { party: Party, ready: bool },
    /// The party committed to the trade as it stands.
    AcceptSignaled { party: Party },
    /// Chat line typed into the trade window.
    Message(String),
    /// The window closed remotely.
    Closed(RemoteClose),
}

impl TradeEvent {
    /// Whether this event counts as activity from the other side for
    /// the action-gap timeout.
    #[must_use]
    pub fn is_other_activity(&self) -> bool {
        match self {
            TradeEvent::ItemAdded { party, .. }
            | TradeEvent::ItemRemoved { party, .. }
            | TradeEvent::ReadyChanged { party, .. }
            | TradeEvent::AcceptSignaled { party } => *party == Party::Other,
            TradeEvent::Message(_) => true,
            TradeEvent::Closed(_) => false,
        }
    }
}

/// Outbound command produced by the session logic, executed against
/// the transport by the polling worker. Keeping these as data makes
/// the state machine synchronously testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeAction {
    /// Line into the trade window chat.
    SendTradeMessage(String),
    /// Line into the regular friend chat.
    SendChatMessage(String),
    /// Put one of the bot's items into the window.
    AddItem(ItemId),
    /// Clear the bot's side of the window.
    RemoveAllItems,
    SetReady(bool),
    /// Commit the trade. May fail ambiguously on large trades.
    Accept,
    /// Abort the trade window.
    Cancel,
}

/// Live trade window operations provided by the external network layer.
pub trait TradeTransport: Send + Sync {
    /// Retrieve incremental changes since the last poll. Blocks (with
    /// a bounded wait) until changes are available or the interval
    /// elapses.
    fn poll(&self) -> BoxFuture<'_, Result<Vec<TradeEvent>, TransportError>>;

    /// Put one of the bot's items into the window. `Ok(false)` means
    /// the item was not available (already consumed, not found).
    fn add_item(&self, id: ItemId) -> BoxFuture<'_, Result<bool, TransportError>>;

    fn remove_all_items(&self) -> BoxFuture<'_, Result<(), TransportError>>;

    fn set_ready(&self, ready: bool) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Commit the trade. Large trades may error even when the exchange
    /// actually went through; callers treat an error as "possibly
    /// succeeded" and never retry.
    fn accept(&self) -> BoxFuture<'_, Result<bool, TransportError>>;

    fn cancel(&self) -> BoxFuture<'_, Result<(), TransportError>>;

    fn send_trade_message(&self, text: &str) -> BoxFuture<'_, Result<(), TransportError>>;

    fn send_chat_message(&self, text: &str) -> BoxFuture<'_, Result<(), TransportError>>;
}

/// Shared transport handle.
pub type DynTradeTransport = Arc<dyn TradeTransport>;

/// Asynchronous inventory fetch, provided by the external web layer.
///
/// A fetch that fails produces a distinct initialization error (the
/// session is then never created); a fetch that succeeds but finds a
/// private inventory returns `InventorySnapshot::private()`.
pub trait InventoryProvider: Send + Sync {
    fn fetch(&self, user_id: u64) -> BoxFuture<'_, Result<InventorySnapshot, TransportError>>;
}

/// Shared inventory provider handle.
pub type DynInventoryProvider = Arc<dyn InventoryProvider>;

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Bot => write!(f, "bot"),
            Party::Other => write!(f, "other"),
        }
    }
}
