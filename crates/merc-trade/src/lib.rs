//! Trade negotiation for the mercbot trading bot.
//!
//! The crate is split along one seam: pure negotiation logic
//! (`session`, `handler`, `validate`, `payment`, `chat`) that turns
//! polled events into `TradeAction`s, and the async shell (`manager`)
//! that owns the single-session slot, polls the transport, and enforces
//! the timeout policy.

pub mod chat;
pub mod config;
pub mod error;
pub mod handler;
pub mod manager;
pub mod payment;
pub mod session;
pub mod transport;
pub mod validate;

pub use config::TradeTimingConfig;
pub use error::{Result, TradeError};
pub use handler::{OrderHandler, TradeEventSink};
pub use manager::{TimeoutCheck, TimeoutTracker, TradeManager};
pub use payment::{plan_payment, PaymentPlan};
pub use session::{CloseReason, TradeSession, TradeState};
pub use transport::{
    BoxFuture, DynInventoryProvider, DynTradeTransport, InventoryProvider, Party, RemoteClose,
    TradeAction, TradeEvent, TradeTransport, TransportError,
};
pub use validate::{validate, ValidationReport};
