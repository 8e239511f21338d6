//! Structured logging.
//!
//! `RUST_LOG` wins over the configured filter; the configured filter wins
//! over the built-in default.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "edge_proxy=info,tower_http=info";

/// Resolve the filter directive string.
///
/// A bare level such as `debug` is scoped to this crate and tower-http so
/// dependency noise stays out of the log.
pub fn filter_directive(configured: &str) -> String {
    let configured = configured.trim();
    if configured.is_empty() {
        DEFAULT_FILTER.to_string()
    } else if configured.contains('=') || configured.contains(',') {
        configured.to_string()
    } else {
        format!("edge_proxy={configured},tower_http={configured}")
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(configured)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
