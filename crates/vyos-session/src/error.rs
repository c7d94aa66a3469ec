//! Error types for session operations.
//!
//! All errors implement `std::error::Error` via `thiserror`. The taxonomy
//! follows the session boundary: [`TransportError`] comes from the client,
//! [`MutationError`] and [`SaveError`] are what the coordinator reports.

use thiserror::Error;

use crate::directive::SaveTarget;
use crate::entry::ConfigEntry;

/// Errors raised while building a [`ConfigPath`](crate::ConfigPath).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The key contained no segments.
    #[error("configuration path is empty")]
    Empty,

    /// A segment was the empty string.
    #[error("configuration path has an empty segment at position {index}")]
    EmptySegment {
        /// Zero-based segment position.
        index: usize,
    },

    /// A segment contained whitespace.
    #[error("configuration path segment '{segment}' contains whitespace")]
    Whitespace {
        /// The offending segment.
        segment: String,
    },
}

/// Failures reported by a [`SessionClient`](crate::SessionClient) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The device refused the API key.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Device or transport message.
        message: String,
    },

    /// The request never reached the device or the connection dropped.
    #[error("network error: {message}")]
    Network {
        /// Underlying transport message.
        message: String,
    },

    /// The per-call timeout elapsed.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },

    /// The device rejected the request (malformed path, invalid value, commit failure).
    #[error("device rejected request: {message}")]
    Rejected {
        /// Error text returned by the device.
        message: String,
    },

    /// The response could not be decoded.
    #[error("malformed response: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// The caller cancelled before this call was issued.
    #[error("operation cancelled")]
    Cancelled,
}

impl TransportError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed if the caller retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Network { .. } | TransportError::Timeout { .. }
        )
    }
}

/// Result type alias for client calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failure of a `mutate` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The batch contained no entries.
    #[error("mutation batch is empty")]
    EmptyBatch,

    /// The same entry appears twice in one batch.
    #[error("mutation batch repeats the same {operation} for '{path}'")]
    DuplicatePath {
        /// The duplicated path, space separated.
        path: String,
        /// `set` or `delete`.
        operation: &'static str,
    },

    /// Cancelled while waiting for the session; nothing was applied.
    #[error("mutation cancelled before acquiring the device session")]
    Cancelled,

    /// The batch stopped part way through.
    #[error("mutation stopped after {applied_count} applied entries at '{failed_entry}': {cause}")]
    Partial {
        /// Number of entries that reached the device before the failure.
        applied_count: usize,
        /// The entry that failed or was skipped.
        failed_entry: ConfigEntry,
        /// Why the batch stopped.
        #[source]
        cause: TransportError,
    },
}

impl MutationError {
    /// Returns how many entries of the batch were applied to the device.
    pub fn applied_count(&self) -> usize {
        match self {
            MutationError::Partial { applied_count, .. } => *applied_count,
            _ => 0,
        }
    }

    /// Returns the entry the batch stopped at, if any.
    pub fn failed_entry(&self) -> Option<&ConfigEntry> {
        match self {
            MutationError::Partial { failed_entry, .. } => Some(failed_entry),
            _ => None,
        }
    }

    /// Returns true if some entries were applied before the failure.
    pub fn is_partial(&self) -> bool {
        self.applied_count() > 0
    }
}

/// Failure of a `conditional_save` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// Cancelled while waiting for the session; no save was attempted.
    #[error("save cancelled before acquiring the device session")]
    Cancelled,

    /// The device failed to persist the running configuration.
    #[error(
        "saving to {target} failed, running and saved configuration are now divergent: {cause}"
    )]
    Failed {
        /// Where the save was directed.
        target: SaveTarget,
        /// Transport failure.
        #[source]
        cause: TransportError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ConfigPath;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::rejected("Configuration path: [foo] is not valid");
        assert_eq!(
            err.to_string(),
            "device rejected request: Configuration path: [foo] is not valid"
        );
        assert_eq!(
            TransportError::Timeout { seconds: 600 }.to_string(),
            "request timed out after 600s"
        );
    }

    #[test]
    fn test_is_transient() {
        assert!(TransportError::network("connection reset").is_transient());
        assert!(TransportError::Timeout { seconds: 1 }.is_transient());
        assert!(!TransportError::rejected("bad value").is_transient());
        assert!(!TransportError::authentication("invalid key").is_transient());
        assert!(!TransportError::Cancelled.is_transient());
    }

    #[test]
    fn test_mutation_error_partial() {
        let entry = ConfigEntry::set(ConfigPath::parse("system host-name").unwrap(), "r1");
        let err = MutationError::Partial {
            applied_count: 1,
            failed_entry: entry.clone(),
            cause: TransportError::rejected("invalid"),
        };

        assert_eq!(err.applied_count(), 1);
        assert_eq!(err.failed_entry(), Some(&entry));
        assert!(err.is_partial());
        assert!(err.to_string().contains("after 1 applied entries"));
        assert!(err.to_string().contains("set system host-name 'r1'"));

        assert_eq!(MutationError::EmptyBatch.applied_count(), 0);
        assert!(!MutationError::Cancelled.is_partial());
    }

    #[test]
    fn test_save_error_reports_divergence() {
        let err = SaveError::Failed {
            target: SaveTarget::File("custom.cfg".to_string()),
            cause: TransportError::network("unreachable"),
        };
        let msg = err.to_string();
        assert!(msg.contains("custom.cfg"));
        assert!(msg.contains("divergent"));
    }
}
