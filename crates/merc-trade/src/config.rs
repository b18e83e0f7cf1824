//! Trade timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lowest allowed poll interval. Configured values below this are
/// clamped upward to avoid hammering the transport.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

fn default_max_trade_secs() -> u64 {
    180
}

fn default_max_action_gap_secs() -> u64 {
    15
}

fn default_poll_interval_ms() -> u64 {
    800
}

/// Timing limits for a live trade session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTimingConfig {
    /// Ceiling on the whole negotiation, in seconds. Default: 180.
    #[serde(default = "default_max_trade_secs")]
    pub max_trade_secs: u64,

    /// Longest tolerated silence from the other side, in seconds.
    /// Default: 15.
    #[serde(default = "default_max_action_gap_secs")]
    pub max_action_gap_secs: u64,

    /// Transport poll interval, in milliseconds. Default: 800,
    /// clamped up to `MIN_POLL_INTERVAL_MS`.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TradeTimingConfig {
    fn default() -> Self {
        Self {
            max_trade_secs: default_max_trade_secs(),
            max_action_gap_secs: default_max_action_gap_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl TradeTimingConfig {
    /// Effective poll interval with the floor applied.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    #[must_use]
    pub fn max_trade_ms(&self) -> u64 {
        self.max_trade_secs * 1000
    }

    #[must_use]
    pub fn max_action_gap_ms(&self) -> u64 {
        self.max_action_gap_secs * 1000
    }
}
