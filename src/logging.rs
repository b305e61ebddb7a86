//! Tracing subscriber setup for the binaries.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "RISIKO_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Logs go to stderr so stdout stays free for JSON and
/// tables. Calling it twice is harmless.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
