//! Storage layer errors.

use thiserror::Error;

/// Errors that can occur in the storage layer.
///
/// Retryability drives the activity retry policy upstream: lock
/// conflicts and connectivity blips are worth another attempt,
/// constraint violations are not.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("not found: {entity} {id}")]
    NotFound {
        /// Type of entity (order, payment, ...)
        entity: String,
        /// Entity ID
        id: String,
    },

    /// Unique/check constraint violation — fatal for the attempt
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Deadlock or serialization failure — retryable
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Connectivity problem — retryable
    #[error("connection error: {0}")]
    Connection(String),

    /// JSON or row decode problem
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other database error — treated as transient
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether a retry of the failed operation could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict(_) | StoreError::Connection(_) | StoreError::Database(_)
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation, not_null_violation, fk_violation, check_violation
                Some("23505") | Some("23502") | Some("23503") | Some("23514") => {
                    StoreError::Constraint(db_err.to_string())
                }
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => StoreError::Conflict(db_err.to_string()),
                _ => StoreError::Database(db_err.to_string()),
            },
            sqlx::Error::RowNotFound => StoreError::not_found("row", "unknown"),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Serialization(err.to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StoreError::Connection(err.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability_classification() {
        assert!(StoreError::Conflict("deadlock".into()).is_retryable());
        assert!(StoreError::Connection("refused".into()).is_retryable());
        assert!(StoreError::Database("hiccup".into()).is_retryable());

        assert!(!StoreError::Constraint("duplicate key".into()).is_retryable());
        assert!(!StoreError::Serialization("bad json".into()).is_retryable());
        assert!(!StoreError::not_found("order", "o-1").is_retryable());
    }
}
