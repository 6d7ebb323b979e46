//! Error types for the engine.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in engine operations.
///
/// Conflict is deliberately not here: a write rejected because the entity
/// is soft-deleted is a valid outcome, reported through
/// [`UpsertOutcome::was_conflict`](crate::UpsertOutcome::was_conflict).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Required input is missing or malformed. Never retried.
    #[error("validation failed: {message}")]
    Validation {
        /// What was missing or malformed.
        message: String,
    },

    /// The operation requires something that does not exist.
    ///
    /// Plain reads report absence as `Ok(None)`; this error is reserved for
    /// operations that require prior existence and for lookups asked to
    /// fail on no match.
    #[error("not found: {what}")]
    NotFound {
        /// What was looked for.
        what: String,
    },

    /// More than one document matched a lookup expected to be unique.
    #[error("ambiguous result: {message}")]
    Ambiguous {
        /// Description of the ambiguous lookup.
        message: String,
    },

    /// Storage gateway error, passed through unchanged.
    #[error("gateway error: {0}")]
    Gateway(#[from] chronicle_gateway::GatewayError),

    /// A stored document failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] chronicle_codec::CodecError),

    /// I/O error (schema bootstrap reads migration scripts from disk).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates an ambiguous-result error.
    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::Ambiguous {
            message: message.into(),
        }
    }

    /// Whether the underlying failure is transient and a retry may help.
    ///
    /// Only gateway connectivity failures and timeouts qualify; the engine
    /// itself never retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Gateway(err) if err.is_transient())
    }
}
