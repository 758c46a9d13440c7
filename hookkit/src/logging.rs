//! Development-time tracing for debugging hooks.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Never written to stdout, which belongs to the host protocol.
//!
//! - **Event logs (`io/jsonl`)**: Product artifacts under the configured
//!   `logDir`. Written by features, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn`, or `debug` when `verbose`.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=hookkit=trace hookkit pre-tool-use < event.json
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
