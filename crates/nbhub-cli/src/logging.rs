use std::env;

use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "NBHUB_DEBUG_LOG";

/// Logs go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` is honored; `NBHUB_DEBUG_LOG=1` forces debug.
pub fn init_logging() {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
