//! Log subscriber setup.

use crate::error::{CamnodeError, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for the given `-q` / `-v` flags.
///
/// `RUST_LOG`, when set, takes precedence over this.
pub fn default_directive(quiet: bool, verbosity: u8) -> &'static str {
    match (quiet, verbosity) {
        (true, _) => "camnode=warn",
        (false, 0) => "camnode=info",
        (false, 1) => "camnode=debug",
        (false, _) => "camnode=trace,tokio=debug",
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Fails if a subscriber is already installed.
pub fn init(quiet: bool, verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| CamnodeError::Other(format!("failed to install logger: {}", e)))
}
