/// Errors from installing the subscriber pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A filter directive did not parse.
    #[error("invalid filter directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber was already installed.
    #[error("subscriber init failed: {0}")]
    Init(String),
}

/// Result alias for telemetry setup.
pub type Result<T> = std::result::Result<T, TelemetryError>;
