// crates/suitebase-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: Diagnostic log subscriber for the CLI.
// Purpose: Route `tracing` events from the library crates to stderr.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Installs a compact `fmt` subscriber filtered by [`LOG_ENV_VAR`]. Output
//! goes to stderr so that command output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "SUITEBASE_LOG";
/// Filter applied when [`LOG_ENV_VAR`] is unset or malformed.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Builds the log filter from `directives`, falling back to the default.
///
/// Directives must be ASCII; anything else selects the default filter.
#[must_use]
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| directives.is_ascii())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber.
///
/// Returns false when a subscriber was already installed.
pub fn init_logging() -> bool {
    let directives = std::env::var(LOG_ENV_VAR).ok();
    tracing_subscriber::registry()
        .with(log_filter(directives.as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .is_ok()
}
