//! Error types for gateway operations.

use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur when talking to the relational backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend could not be reached or a connection could not be acquired.
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// Description of the connectivity failure.
        message: String,
    },

    /// A statement exceeded its timeout. No partial effects are applied.
    #[error("statement timed out: {message}")]
    Timeout {
        /// Description of the timed-out statement.
        message: String,
    },

    /// The backend rejected a statement.
    #[error("backend error: {message}")]
    Backend {
        /// The backend's error message.
        message: String,
    },
}

impl GatewayError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Whether the failure is transient and the caller may retry.
    ///
    /// Connectivity failures and timeouts are retryable; statement
    /// rejections are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}
