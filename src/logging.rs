//! Tracing subscriber initialization for the CLI.
//!
//! Uses `tracing-subscriber` with an [`EnvFilter`]: the `-v` flags pick a
//! default level, and `RUST_LOG` always wins so a field deployment can tune
//! per-module filtering without rebuilding.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// `verbosity` is the count of `-v` flags: 0 is `info`, 1 is `debug`, 2 or
/// more is `trace`. Calling this twice is a no-op, which keeps it safe from
/// tests.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
