use thiserror::Error;

/// Result type alias for echoip operations
pub type Result<T> = std::result::Result<T, EchoipError>;

/// Errors that can occur while resolving information about an address
#[derive(Error, Debug)]
pub enum EchoipError {
    /// No parseable address could be found for the request
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A caller supplied an out-of-range value (port, cache capacity)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An enrichment provider failed or is disabled
    #[error("{provider} lookup unavailable: {reason}")]
    ProviderUnavailable {
        /// Name of the provider that failed
        provider: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// File I/O failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EchoipError {
    /// Returns true if the error was caused by the caller's input
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::InvalidArgument(_))
    }

    /// Returns the HTTP status code a presentation layer should answer with
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAddress(_) | Self::InvalidArgument(_) => 400,
            Self::ProviderUnavailable { .. } => 503,
            Self::Config(_) | Self::Io(_) => 500,
        }
    }
}
