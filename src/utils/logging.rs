//! Logging setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Install a global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Calling this again after a subscriber is installed is a no-op.
pub fn setup_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| {
            Error::InvalidConfiguration(format!("bad log level '{}': {}", level, e))
        })?,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(filter)
        .try_init()
        .ok();

    Ok(())
}

/// Map a `-v` count onto a level, falling back to `configured` when zero
pub fn verbosity_level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}
