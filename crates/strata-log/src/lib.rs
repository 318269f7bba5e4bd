//! Structured logging for the terrain engine.
//!
//! Provides structured, filterable logging via the `tracing` ecosystem:
//! console output with uptime timestamps, module paths, and thread names
//! (worker threads are named, which makes pipeline logs legible).
//! Integrates with the configuration system for runtime level control.

use strata_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// The filter honours `RUST_LOG` when set; otherwise it falls back to the
/// config's `debug.log_level` (or plain `info`). Calling this twice panics,
/// as only one global subscriber can exist; call it once at startup.
pub fn init_logging(config: Option<&Config>) {
    let filter_str = config
        .map(|c| c.debug.log_level.as_str())
        .filter(|level| !level.is_empty())
        .unwrap_or("info");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}
