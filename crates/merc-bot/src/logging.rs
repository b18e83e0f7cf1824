//! Structured logging initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{BotError, BotResult};

/// Initialize structured logging.
///
/// JSON output for production (`RUST_ENV=production`), pretty output
/// for development. The filter defaults to `info` with `debug` for the
/// bot's own crates and honors `RUST_LOG`. Fails if a global
/// subscriber is already installed.
pub fn init_logging() -> BotResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,merc=debug"));

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init()
    }
    .map_err(|e| BotError::Config(format!("failed to install tracing subscriber: {e}")))
}
