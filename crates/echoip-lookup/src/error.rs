use thiserror::Error;

/// Result type alias for provider lookups
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Errors from enrichment providers
#[derive(Error, Debug)]
pub enum LookupError {
    /// GeoIP database could not be opened or read
    #[error("database error: {0}")]
    Database(String),

    /// Reverse DNS resolution error
    #[error("DNS error: {0}")]
    Dns(String),

    /// HTTP transport error talking to a remote provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// A remote provider answered with an error
    #[error("API error {code}: {message}")]
    Api {
        /// Provider error code
        code: u16,
        /// Provider error description
        message: String,
    },

    /// Network I/O error
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// Timeout
    #[error("operation timed out")]
    Timeout,

    /// The provider has no data for this address
    #[error("no data for address")]
    NotFound,

    /// The provider is switched off
    #[error("provider disabled")]
    Disabled,
}

impl LookupError {
    /// Convert into the pipeline error for a named provider
    #[must_use]
    pub fn into_unavailable(self, provider: &'static str) -> echoip_core::EchoipError {
        echoip_core::EchoipError::ProviderUnavailable {
            provider,
            reason: self.to_string(),
        }
    }
}

impl From<LookupError> for echoip_core::EchoipError {
    fn from(err: LookupError) -> Self {
        err.into_unavailable("enrichment")
    }
}
