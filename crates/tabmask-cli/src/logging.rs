//! Logging setup for the CLI
//!
//! Logs go to stderr so command output stays clean. Cell values are never
//! logged by the core, only column names, counts and paths.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map `-v` occurrences to a level
///
/// - 0: warn
/// - 1 (`-v`): info
/// - 2 (`-vv`): debug
/// - 3+ (`-vvv`): trace
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `-v`.
pub fn init_logging(verbosity: u8) {
    let level = level_from_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // Fails only when a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
