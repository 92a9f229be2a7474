//! Error types for alias reconciliation
//!
//! Backends speak in [`BackendError`]s, the raw view of whatever service sits
//! behind them. Those are classified into the domain [`Error`] exactly once,
//! in the `From<BackendError>` impl below. Nothing else in the crate inspects
//! backend error codes.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for alias operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by backend collaborators
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Message shown whenever the credential chain yields nothing usable.
pub const INVALID_CREDENTIALS_MESSAGE: &str =
    "Invalid provider credentials. Configure a credential source (environment, shared credentials file or instance profile) and try again.";

/// Core error type for alias reconciliation
#[derive(Error, Debug)]
pub enum Error {
    /// The credential chain is absent or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network or service failure, not further classified
    #[error("Transport error: {0}")]
    Transport(String),

    /// No zone matched after scanning every page
    #[error("Zone does not exist: {0}")]
    ZoneNotFound(String),

    /// No load balancer matched after scanning every page
    #[error("Load balancer does not exist: {0}")]
    LoadBalancerNotFound(String),

    /// No alias record matched after scanning every page
    #[error("Record does not exist: {0}")]
    RecordNotFound(String),

    /// The provider does not know the change id
    #[error("Change does not exist: {0}")]
    ChangeNotFound(String),

    /// Propagation was not confirmed before the deadline
    #[error("Change {change_id} was not in sync after {waited:?}")]
    Timeout {
        /// Id of the submitted change
        change_id: String,
        /// How long the waiter waited
        waited: Duration,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific failure that is not a remote call
    #[error("Backend error ({backend}): {message}")]
    Backend {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a backend-specific error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Short, stable label for the error category
    pub fn category(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::Transport(_) => "transport",
            Self::ZoneNotFound(_) => "zone-not-found",
            Self::LoadBalancerNotFound(_) => "load-balancer-not-found",
            Self::RecordNotFound(_) => "record-not-found",
            Self::ChangeNotFound(_) => "change-not-found",
            Self::Timeout { .. } => "timeout",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid-input",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Backend { .. } => "backend",
            Self::Other(_) => "other",
        }
    }

    /// Whether this is a definitive "no such entity" answer
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ZoneNotFound(_)
                | Self::LoadBalancerNotFound(_)
                | Self::RecordNotFound(_)
                | Self::ChangeNotFound(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Raw error reported by a backend collaborator
///
/// `code` carries the provider's own error code; `message` its text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct BackendError {
    /// Provider error code
    pub code: String,
    /// Provider error message
    pub message: String,
}

impl BackendError {
    /// The credential chain yielded no usable credentials
    pub const NO_VALID_CREDENTIALS: &'static str = "NoCredentialProviders";

    /// The change id is unknown to the provider
    pub const NO_SUCH_CHANGE: &'static str = "NoSuchChange";

    /// A change batch did not match the current record content
    pub const INVALID_CHANGE_BATCH: &'static str = "InvalidChangeBatch";

    /// The hosted zone does not exist
    pub const NO_SUCH_HOSTED_ZONE: &'static str = "NoSuchHostedZone";

    /// Create a backend error with the given code
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Shortcut for a credential chain failure
    pub fn no_credentials() -> Self {
        Self::new(
            Self::NO_VALID_CREDENTIALS,
            "no valid providers in credential chain",
        )
    }

    /// Shortcut for an unknown change id
    pub fn no_such_change(id: &str) -> Self {
        Self::new(Self::NO_SUCH_CHANGE, format!("change {} not found", id))
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        tracing::debug!(code = %err.code, error = %err.message, "backend error");

        match err.code.as_str() {
            BackendError::NO_VALID_CREDENTIALS => Error::auth(INVALID_CREDENTIALS_MESSAGE),
            BackendError::NO_SUCH_CHANGE => Error::ChangeNotFound(err.message),
            _ => Error::transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failure_becomes_authentication() {
        let err: Error = BackendError::no_credentials().into();
        assert!(matches!(err, Error::Authentication(ref msg) if msg == INVALID_CREDENTIALS_MESSAGE));
        assert_eq!(err.category(), "authentication");
    }

    #[test]
    fn unknown_change_becomes_change_not_found() {
        let err: Error = BackendError::no_such_change("C1").into();
        assert!(matches!(err, Error::ChangeNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn other_codes_become_transport() {
        let err: Error = BackendError::new("Throttling", "rate exceeded").into();
        match err {
            Error::Transport(msg) => {
                assert!(msg.contains("Throttling"));
                assert!(msg.contains("rate exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn timeout_message_names_the_change() {
        let err = Error::Timeout {
            change_id: "/change/C42".to_string(),
            waited: Duration::from_secs(60),
        };
        assert!(err.to_string().contains("/change/C42"));
        assert!(!err.is_not_found());
    }
}
