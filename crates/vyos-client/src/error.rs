//! Errors raised while constructing an HTTP session client.

use thiserror::Error;

/// Result type alias for client construction.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client construction failures. Call failures are
/// [`TransportError`](vyos_session::TransportError)s.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The device URL could not be used.
    #[error("invalid device url '{url}': {message}")]
    InvalidUrl {
        /// The configured URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// The HTTP stack could not be initialized.
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

impl ClientError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::invalid_url("ftp://vyos", "unsupported scheme 'ftp'");
        assert_eq!(
            err.to_string(),
            "invalid device url 'ftp://vyos': unsupported scheme 'ftp'"
        );
    }
}
