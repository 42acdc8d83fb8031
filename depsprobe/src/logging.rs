//! Diagnostic tracing for the `depsprobe` binary.
//!
//! Resolution results go to stdout; every trace event goes to stderr, so
//! `RUST_LOG` never changes what callers parse.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn`, which reports tolerated missing
/// assets and host RIDs absent from the fallback graph.
///
/// # Example
/// ```bash
/// RUST_LOG=depsprobe=debug depsprobe resolve --app-root ./publish
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
