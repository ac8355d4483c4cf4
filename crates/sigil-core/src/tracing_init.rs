//! Shared tracing/logging initialization.
//!
//! Any binary embedding the protocol sets up `tracing_subscriber` the
//! same way: env-filter with the configured default level, optional JSON
//! output. The receive path's rejection causes surface at `debug`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogConfig;

/// Initialise the global tracing subscriber from the resolved log config.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(log: &LogConfig) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| log.level.clone()),
    );
    if log.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
