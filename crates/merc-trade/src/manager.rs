//! Session lifecycle and the polling worker.
//!
//! `TradeManager` owns the single-session slot: at most one trade
//! window is open at any time, and a second request is refused without
//! touching the first. For an accepted request it fetches both
//! inventory snapshots, builds the session, and spawns a worker that
//! polls the transport, feeds events to the handler, executes the
//! resulting actions, and enforces the timeout policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::TradeTimingConfig;
use crate::error::{Result, TradeError};
use crate::handler::TradeEventSink;
use crate::session::{CloseReason, TradeSession, TradeState};
use crate::transport::{DynInventoryProvider, DynTradeTransport, TradeAction};

/// How many consecutive poll failures are tolerated before the session
/// is abandoned.
const MAX_CONSECUTIVE_POLL_ERRORS: u32 = 5;

const WARNING_WINDOW_MS: u64 = 30_000;
const WARNING_THROTTLE_MS: u64 = 10_000;

// ============================================================================
// Timeout tracking
// ============================================================================

/// Verdict of a timeout check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCheck {
    Proceed,
    /// Within the warning window; nag the other side.
    Warn { seconds_left: u64 },
    Expired,
}

/// Pure clock arithmetic for the two trade deadlines: the overall
/// ceiling and the silence gap. Timestamps are opaque milliseconds so
/// tests can drive it directly.
#[derive(Debug)]
pub struct TimeoutTracker {
    config: TradeTimingConfig,
    started_at_ms: u64,
    last_activity_ms: u64,
    last_warning_ms: Option<u64>,
}

impl TimeoutTracker {
    #[must_use]
    pub fn new(config: TradeTimingConfig, now_ms: u64) -> Self {
        Self {
            config,
            started_at_ms: now_ms,
            last_activity_ms: now_ms,
            last_warning_ms: None,
        }
    }

    /// Record activity from the other side; resets the gap deadline.
    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    /// Check both deadlines. Once the other side has accepted the
    /// remaining wait is on the bot, so timeouts no longer apply.
    /// `Warn` is throttled internally; callers send every warning they
    /// are handed.
    pub fn check(&mut self, now_ms: u64, other_accepted: bool) -> TimeoutCheck {
        if other_accepted {
            return TimeoutCheck::Proceed;
        }

        let total_deadline = self.started_at_ms + self.config.max_trade_ms();
        let gap_deadline = self.last_activity_ms + self.config.max_action_gap_ms();
        let deadline = total_deadline.min(gap_deadline);

        if now_ms >= deadline {
            return TimeoutCheck::Expired;
        }

        let remaining = deadline - now_ms;
        if remaining <= WARNING_WINDOW_MS {
            let throttled = self
                .last_warning_ms
                .is_some_and(|last| now_ms - last < WARNING_THROTTLE_MS);
            if !throttled {
                self.last_warning_ms = Some(now_ms);
                return TimeoutCheck::Warn {
                    seconds_left: remaining / 1000,
                };
            }
        }
        TimeoutCheck::Proceed
    }
}

// ============================================================================
// The manager
// ============================================================================

struct OpenSlot {
    other_id: u64,
    stop: Arc<AtomicBool>,
}

/// Opens and supervises trade sessions, one at a time.
pub struct TradeManager {
    config: TradeTimingConfig,
    handler: Arc<dyn TradeEventSink>,
    inventories: DynInventoryProvider,
    own_id: u64,
    slot: Arc<Mutex<Option<OpenSlot>>>,
}

impl TradeManager {
    #[must_use]
    pub fn new(
        own_id: u64,
        config: TradeTimingConfig,
        handler: Arc<dyn TradeEventSink>,
        inventories: DynInventoryProvider,
    ) -> Self {
        Self {
            config,
            handler,
            inventories,
            own_id,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Id of the open session's counterparty, if any.
    #[must_use]
    pub fn open_session_with(&self) -> Option<u64> {
        self.slot.lock().as_ref().map(|open| open.other_id)
    }

    /// Ask the open session, if any, to cancel on its next poll tick.
    pub fn cancel_open_session(&self) {
        if let Some(open) = self.slot.lock().as_ref() {
            info!(other_id = open.other_id, "cancel requested for open session");
            open.stop.store(true, Ordering::SeqCst);
        }
    }

    /// Open a session with `other_id` over an established trade window
    /// and spawn its polling worker.
    ///
    /// Refuses (leaving the existing session untouched) when a session
    /// is already open, and fails without creating anything when either
    /// inventory cannot be fetched. A private inventory is not a fetch
    /// failure; it surfaces later, during matching and validation.
    pub async fn open_session(
        &self,
        other_id: u64,
        trusted: bool,
        transport: DynTradeTransport,
    ) -> Result<JoinHandle<CloseReason>> {
        if let Some(open) = self.slot.lock().as_ref() {
            return Err(TradeError::SessionAlreadyOpen {
                other_id: open.other_id,
            });
        }

        let my_inventory = self
            .inventories
            .fetch(self.own_id)
            .await
            .map_err(|e| TradeError::InventoryInit(e.to_string()))?;
        let their_inventory = self
            .inventories
            .fetch(other_id)
            .await
            .map_err(|e| TradeError::InventoryInit(e.to_string()))?;

        let stop = Arc::new(AtomicBool::new(false));
        {
            let mut slot = self.slot.lock();
            // A concurrent open may have won the race while we were
            // fetching inventories.
            if let Some(open) = slot.as_ref() {
                return Err(TradeError::SessionAlreadyOpen {
                    other_id: open.other_id,
                });
            }
            *slot = Some(OpenSlot {
                other_id,
                stop: Arc::clone(&stop),
            });
        }

        info!(other_id, trusted, "trade session opened");
        let session = TradeSession::new(other_id, trusted, my_inventory, their_inventory);
        let worker = SessionWorker {
            config: self.config,
            handler: Arc::clone(&self.handler),
            transport,
            slot: Arc::clone(&self.slot),
            stop,
        };
        Ok(tokio::spawn(worker.run(session)))
    }
}

// ============================================================================
// The polling worker
// ============================================================================

struct SessionWorker {
    config: TradeTimingConfig,
    handler: Arc<dyn TradeEventSink>,
    transport: DynTradeTransport,
    slot: Arc<Mutex<Option<OpenSlot>>>,
    stop: Arc<AtomicBool>,
}

impl SessionWorker {
    async fn run(self, mut session: TradeSession) -> CloseReason {
        let started = Instant::now();
        let now_ms = || started.elapsed().as_millis() as u64;
        let mut tracker = TimeoutTracker::new(self.config, 0);
        let mut consecutive_errors = 0u32;

        let actions = self.handler.on_session_start(&mut session);
        self.execute_all(&mut session, actions).await;

        while session.is_open() && !self.stop.load(Ordering::SeqCst) {
            tokio::time::sleep(self.config.poll_interval()).await;

            let events = match self.transport.poll().await {
                Ok(events) => {
                    consecutive_errors = 0;
                    events
                }
                Err(err) => {
                    consecutive_errors += 1;
                    warn!(error = %err, consecutive_errors, "trade poll failed");
                    if consecutive_errors >= MAX_CONSECUTIVE_POLL_ERRORS {
                        error!("too many consecutive poll failures, abandoning trade");
                        session.close(CloseReason::Error(err.to_string()));
                    }
                    continue;
                }
            };

            for event in events {
                if event.is_other_activity() {
                    tracker.record_activity(now_ms());
                }
                let actions = self.handler.on_event(&mut session, event);
                self.execute_all(&mut session, actions).await;
                if !session.is_open() {
                    break;
                }
            }

            if session.is_open() {
                match tracker.check(now_ms(), session.other_accepted()) {
                    TimeoutCheck::Proceed => {}
                    TimeoutCheck::Warn { seconds_left } => {
                        let text = format!(
                            "Are you still there? The trade will be canceled in {seconds_left} seconds if you do not respond."
                        );
                        self.execute(&mut session, TradeAction::SendTradeMessage(text))
                            .await;
                    }
                    TimeoutCheck::Expired => {
                        info!(other_id = session.other_id(), "trade timed out");
                        session.close(CloseReason::TimedOut);
                        self.execute(&mut session, TradeAction::Cancel).await;
                        self.execute(
                            &mut session,
                            TradeAction::SendChatMessage(
                                "I have cancelled the trade as you were AFK.".to_string(),
                            ),
                        )
                        .await;
                    }
                }
            }
        }

        if self.stop.load(Ordering::SeqCst) && session.is_open() {
            session.close(CloseReason::Cancelled);
            self.execute(&mut session, TradeAction::Cancel).await;
        }

        session.finalize();
        *self.slot.lock() = None;

        let reason = match session.state() {
            TradeState::Closed(reason) => reason.clone(),
            // Unreachable: the loop only exits once the session is
            // closing, and finalize() seals it.
            _ => CloseReason::Error("session ended in a non-closed state".to_string()),
        };
        info!(other_id = session.other_id(), ?reason, "trade session finished");
        reason
    }

    async fn execute_all(&self, session: &mut TradeSession, actions: Vec<TradeAction>) {
        for action in actions {
            self.execute(session, action).await;
        }
    }

    /// Run one action against the transport. Failures are logged, not
    /// retried; the next poll reveals the real window state.
    async fn execute(&self, session: &mut TradeSession, action: TradeAction) {
        debug!(?action, "executing trade action");
        match action {
            TradeAction::SendTradeMessage(text) => {
                if let Err(err) = self.transport.send_trade_message(&text).await {
                    warn!(error = %err, "failed to send trade message");
                }
            }
            TradeAction::SendChatMessage(text) => {
                if let Err(err) = self.transport.send_chat_message(&text).await {
                    warn!(error = %err, "failed to send chat message");
                }
            }
            TradeAction::AddItem(id) => match self.transport.add_item(id).await {
                Ok(true) => {}
                Ok(false) => warn!(%id, "item could not be added to the window"),
                Err(err) => warn!(error = %err, %id, "failed to add item"),
            },
            TradeAction::RemoveAllItems => {
                if let Err(err) = self.transport.remove_all_items().await {
                    warn!(error = %err, "failed to clear own side");
                }
            }
            TradeAction::SetReady(ready) => {
                if let Err(err) = self.transport.set_ready(ready).await {
                    warn!(error = %err, "failed to set ready state");
                }
            }
            TradeAction::Accept => match self.transport.accept().await {
                Ok(_) => {}
                Err(err) => {
                    // Large trades can report failure even when the
                    // exchange went through. Never retry; wait for the
                    // close event to learn the real outcome.
                    warn!(error = %err, "accept returned an error; the trade might have failed, but we can't be sure");
                }
            },
            TradeAction::Cancel => {
                if let Err(err) = self.transport.cancel().await {
                    warn!(error = %err, "failed to cancel the trade window");
                }
                session.close(CloseReason::Cancelled);
            }
        }
    }
}
