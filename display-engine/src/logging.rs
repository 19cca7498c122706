//! Diagnostic tracing for the engine.
//!
//! Decisions are printed to stdout as JSON; tracing output goes to stderr and
//! never mixes with it.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn`, or to `display_engine=debug` when the
/// page URL carries the debug query parameter.
///
/// # Example
/// ```bash
/// RUST_LOG=display_engine=debug display-engine filter --environment env.json --user user.json
/// ```
pub fn init(debug: bool) {
    let fallback = if debug { "display_engine=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
