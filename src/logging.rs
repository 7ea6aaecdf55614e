//! Logging setup.
//!
//! Everything goes to stderr. With the stdio Authenticator transport, stdout
//! carries protocol frames and a single stray line corrupts the stream.

use crate::config::LogSettings;
use crate::error::BindingResult;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "SAFE_APP_BINDING_LOG";

/// Install a global `tracing` subscriber. Fails if one is already installed.
#[cfg(feature = "logging")]
pub fn init(settings: &LogSettings) -> BindingResult<()> {
    use crate::error::BindingError;
    use tracing_subscriber::EnvFilter;

    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| BindingError::Config(format!("invalid log filter: {e}")))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| BindingError::Config(format!("cannot install logger: {e}")))
}

/// Without the `logging` feature the embedder installs its own subscriber.
#[cfg(not(feature = "logging"))]
pub fn init(_settings: &LogSettings) -> BindingResult<()> {
    Ok(())
}
