use thiserror::Error;
use uuid::Uuid;

use super::scope::SequenceScope;

/// Failures surfaced by a move.
///
/// Allocation and rebalancing never raise business errors themselves; the
/// mover classifies everything at the transaction boundary and rolls back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("item {id} not found in {scope}")]
    NotFound { scope: SequenceScope, id: Uuid },

    #[error("concurrent modification in {scope}: {reason}")]
    ConcurrencyConflict { scope: SequenceScope, reason: String },

    #[error("order key space exhausted around anchor {anchor} in {scope}")]
    ExhaustedKeySpace { scope: SequenceScope, anchor: Uuid },

    #[error("database operation failed: {operation}: {message}")]
    Database { operation: String, message: String },

    /// No connection could be obtained in time
    #[error("database unavailable during {operation}")]
    Unavailable { operation: String },
}

impl SequenceError {
    pub fn not_found(scope: SequenceScope, id: Uuid) -> Self {
        Self::NotFound { scope, id }
    }

    pub fn conflict(scope: SequenceScope, reason: impl Into<String>) -> Self {
        Self::ConcurrencyConflict {
            scope,
            reason: reason.into(),
        }
    }

    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether the caller may retry the same move unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, SequenceError::ConcurrencyConflict { .. })
    }
}

pub type SequenceResult<T> = Result<T, SequenceError>;
