use thiserror::Error;

/// Errors raised while configuring, building or running a SignalFx exporter.
#[derive(Error, Debug)]
pub enum ExporterError {
    /// The configured timeout is below zero.
    #[error("\"signalfx\" config cannot have a negative \"timeout\"")]
    InvalidTimeout,

    /// Neither a realm nor an explicit url was configured.
    #[error("\"signalfx\" config requires a non-empty \"realm\" or \"url\"")]
    MissingEndpoint,

    /// The factory was asked for a signal it does not export.
    #[error("telemetry type is not supported")]
    UnsupportedSignal,

    /// Config could not be decoded or turned into an endpoint.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Push attempted after shutdown.
    #[error("Exporter has been shut down")]
    ExporterShutdown,

    /// Ingest answered with a non-success status.
    #[error("Ingest rejected request with HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Timeout error: request took longer than {timeout_ms}ms")]
    Timeout {
        /// Configured request timeout.
        timeout_ms: u64,
    },

    /// Connection or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Fieldless mirror of [`ExporterError`] for matching on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ExporterError::InvalidTimeout`].
    InvalidTimeout,
    /// See [`ExporterError::MissingEndpoint`].
    MissingEndpoint,
    /// See [`ExporterError::UnsupportedSignal`].
    UnsupportedSignal,
    /// See [`ExporterError::Config`].
    Config,
    /// See [`ExporterError::ExporterShutdown`].
    ExporterShutdown,
    /// See [`ExporterError::Http`].
    Http,
    /// See [`ExporterError::Timeout`].
    Timeout,
    /// See [`ExporterError::Network`].
    Network,
    /// See [`ExporterError::Serialization`].
    Serialization,
    /// See [`ExporterError::Io`].
    Io,
}

impl ExporterError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTimeout => ErrorKind::InvalidTimeout,
            Self::MissingEndpoint => ErrorKind::MissingEndpoint,
            Self::UnsupportedSignal => ErrorKind::UnsupportedSignal,
            Self::Config(_) => ErrorKind::Config,
            Self::ExporterShutdown => ErrorKind::ExporterShutdown,
            Self::Http { .. } => ErrorKind::Http,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::Network,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns true if the same request could succeed when sent again.
    ///
    /// Nothing in this crate retries; the flag is for hosts that do.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTimeout | Self::MissingEndpoint | Self::Config(_) => "config",
            Self::UnsupportedSignal => "unsupported",
            Self::ExporterShutdown => "lifecycle",
            Self::Http { .. } | Self::Network(_) => "network",
            Self::Timeout { .. } => "timeout",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}
