//! Telemetry initialization.
//!
//! Components in this crate log through the `tracing` macros; the embedding
//! application decides where that output goes by installing a subscriber,
//! either its own or the one built here.

use std::env;

/// Initializes tracing using the provided log level as the default filter.
///
/// `RUST_LOG` overrides the directive when set. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("stocklot={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Convenience wrapper used by tests and examples.
pub fn init_default_tracing() {
    init_tracing("info", false);
}
