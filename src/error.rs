//! Error types for vantage-backends
//!
//! Provides the structured error taxonomy shared by the registry, the
//! connection lifecycle manager, the query executor and the configuration
//! compiler.

use crate::compile::ValidationResult;
use crate::config_schema::ConfigViolation;
use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for backend operations
///
/// Configuration errors carry *every* violated field, never just the first,
/// so a UI can highlight all problems at once. Connection and query errors
/// preserve the backend name and the original message. No variant triggers
/// automatic retry inside this crate; backoff/retry is a caller concern.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No backend registered under the requested name
    #[error("unknown backend '{0}'")]
    UnknownBackend(String),

    /// A backend with this name is already registered
    #[error("backend '{0}' is already registered")]
    DuplicateBackend(String),

    /// Connection configuration violated the backend's config schema
    #[error("invalid configuration for backend '{backend}': {}", format_violations(.violations))]
    InvalidConfig {
        backend: String,
        violations: Vec<ConfigViolation>,
    },

    /// The backend's connect operation failed
    #[error("failed to connect to backend '{backend}': {message}")]
    ConnectFailed { backend: String, message: String },

    /// Operation issued against a closed connection
    #[error("connection '{0}' is closed")]
    ConnectionClosed(String),

    /// The backend reported a query failure
    #[error("query failed on backend '{backend}': {message}")]
    QueryExecution { backend: String, message: String },

    /// The caller-supplied timeout elapsed before the backend answered.
    /// The connection is left open; cancellation of outstanding native
    /// work is the plugin's responsibility.
    #[error("query timed out after {timeout_ms}ms on backend '{backend}'")]
    QueryTimeout { backend: String, timeout_ms: u64 },

    /// The backend's concurrent-connection ceiling was reached
    #[error("backend '{backend}' reached its connection ceiling of {limit}")]
    TooManyConnections { backend: String, limit: usize },

    /// A compiled factory configuration failed validation
    #[error("factory configuration failed validation: {} error(s)", .0.errors.len())]
    Validation(ValidationResult),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl BackendError {
    /// Create an unknown-backend error
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownBackend(name.into())
    }

    /// Create a duplicate-backend error
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateBackend(name.into())
    }

    /// Create an invalid-config error from a list of violations
    pub fn invalid_config(backend: impl Into<String>, violations: Vec<ConfigViolation>) -> Self {
        Self::InvalidConfig {
            backend: backend.into(),
            violations,
        }
    }

    /// Create a connect-failed error
    pub fn connect_failed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectFailed {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a closed-connection error
    pub fn closed(connection_id: impl Into<String>) -> Self {
        Self::ConnectionClosed(connection_id.into())
    }

    /// Create a query-execution error
    pub fn query(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryExecution {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a query-timeout error
    pub fn timeout(backend: impl Into<String>, timeout_ms: u64) -> Self {
        Self::QueryTimeout {
            backend: backend.into(),
            timeout_ms,
        }
    }

    /// Create a connection-ceiling error
    pub fn too_many(backend: impl Into<String>, limit: usize) -> Self {
        Self::TooManyConnections {
            backend: backend.into(),
            limit,
        }
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// The crate itself never retries; this classification exists for
    /// callers implementing their own backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. } | Self::QueryTimeout { .. } | Self::TooManyConnections { .. }
        )
    }
}
