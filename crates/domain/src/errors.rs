//! Error types used throughout the bridge

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for K3Bridge
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum K3Error {
    /// The login operation returned a non-success result type.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The remote system reported a business failure.
    #[error("Kingdee API error: {0}")]
    Api(String),

    /// Network or protocol failure without a parseable body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed JSON in a caller-supplied parameter field.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Broken invariant inside the bridge.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classes used by hosts to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Login rejected.
    Authentication,
    /// Rejected by business rules.
    Business,
    /// Transport failure; worth retrying.
    Network,
    /// Bad caller input or configuration.
    Input,
    /// Bug in the bridge.
    Internal,
}

impl K3Error {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Api(_) => ErrorCategory::Business,
            Self::Transport(_) => ErrorCategory::Network,
            Self::Parse(_) | Self::Config(_) => ErrorCategory::Input,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Only transport failures are worth retrying; everything else is
    /// deterministic for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }

    /// The bare message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication(m)
            | Self::Api(m)
            | Self::Transport(m)
            | Self::Parse(m)
            | Self::Config(m)
            | Self::Internal(m) => m,
        }
    }
}

/// A batch aborted because one item failed and continue-on-error was off.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("item {index} failed: {source}")]
pub struct BatchError {
    /// Original input position of the failing item.
    pub index: usize,
    /// Why it failed.
    #[source]
    pub source: K3Error,
}

impl From<BatchError> for K3Error {
    fn from(err: BatchError) -> Self {
        err.source
    }
}

/// Result type alias for K3Bridge operations
pub type Result<T> = std::result::Result<T, K3Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        assert_eq!(
            K3Error::Authentication("x".into()).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(K3Error::Api("x".into()).category(), ErrorCategory::Business);
        assert_eq!(K3Error::Transport("x".into()).category(), ErrorCategory::Network);
        assert_eq!(K3Error::Parse("x".into()).category(), ErrorCategory::Input);
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(K3Error::Transport("reset".into()).is_retryable());
        assert!(!K3Error::Api("bad".into()).is_retryable());
        assert!(!K3Error::Authentication("bad".into()).is_retryable());
        assert!(!K3Error::Parse("bad".into()).is_retryable());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(K3Error::Api("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Api", "message": "boom"}));
    }

    #[test]
    fn batch_error_names_the_item() {
        let err = BatchError { index: 3, source: K3Error::Api("denied".into()) };
        assert_eq!(err.to_string(), "item 3 failed: Kingdee API error: denied");
        let inner: K3Error = err.into();
        assert_eq!(inner.message(), "denied");
    }
}
