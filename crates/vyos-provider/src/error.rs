//! Error types for the VyOS provider

use std::path::PathBuf;

use thiserror::Error;

use vyos_client::ClientError;
use vyos_session::{MutationError, PathError, SaveError, TransportError};

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Invalid provider configuration, detected before any client is built
    #[error("Configuration error: {field}: {message}")]
    Configuration { field: &'static str, message: String },

    /// File could not be read
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for its schema
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Apply plan is inconsistent
    #[error("Invalid plan: {0}")]
    Plan(String),

    /// Resource attribute is not a valid configuration path
    #[error("Invalid path: {0}")]
    Path(#[from] PathError),

    /// HTTP client could not be built
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Mutation batch failed
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Save failed; running configuration is ahead of the saved one
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Reading configuration back failed
    #[error("Read failed: {0}")]
    Read(#[from] TransportError),

    /// Resource task panicked or was aborted
    #[error("Resource task failed: {0}")]
    Task(String),
}

impl ProviderError {
    /// Create a configuration error
    pub fn configuration(field: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            message: message.into(),
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
