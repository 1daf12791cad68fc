//! Development-time tracing for debugging agent runs.
//!
//! Diagnostics the collaborator must see go through `Coder::report_error` /
//! `Coder::report_info`; tracing is for dev visibility only, controlled by
//! `RUST_LOG` and written to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=fixloop=debug cargo run -- run lint --config agents.toml
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
