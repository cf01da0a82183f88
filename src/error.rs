//! Error handling for the linkmon crate.

/// A specialized `Result` type for linkmon operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for linkmon operations.
///
/// Probe failures never surface here; they are recorded as metric increments
/// and swallowed inside the probe. This type covers the paths that are
/// allowed to be fatal: configuration, registry setup and the exporter.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Exporter web server error
    #[error("Web server error: {0}")]
    WebServer(String),
}

impl MonitorError {
    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }
}
