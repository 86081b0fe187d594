//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber once
//! - Honour `RUST_LOG`, falling back to the configured filter

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` wins over the configured directive.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
