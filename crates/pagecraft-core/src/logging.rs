//! Logging setup.
//!
//! Library code emits `tracing` events and never installs a subscriber.
//! Hosts that want structured JSON logs can enable the `tracing-json`
//! feature and call [`init_json`] once at startup.

/// Environment variable holding the `EnvFilter` directive (e.g. `pagecraft_tree=debug`).
pub const ENV_LOG_FILTER: &str = "PAGECRAFT_LOG";

/// Filter used when [`ENV_LOG_FILTER`] is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a global JSON subscriber filtered by [`ENV_LOG_FILTER`].
///
/// Fails if a global subscriber is already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json() -> Result<(), LoggingInitError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(ENV_LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| LoggingInitError(err.to_string()))
}

/// Subscriber installation failure.
#[cfg(feature = "tracing-json")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingInitError(pub String);

#[cfg(feature = "tracing-json")]
impl std::fmt::Display for LoggingInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to install tracing subscriber: {}", self.0)
    }
}

#[cfg(feature = "tracing-json")]
impl std::error::Error for LoggingInitError {}
