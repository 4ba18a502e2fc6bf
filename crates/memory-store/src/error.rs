//! Store error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during store operations.
///
/// The store never retries internally: validation failures are the
/// caller's to fix, storage failures are the caller's to retry, and an
/// unknown outcome is the caller's to resolve by re-querying.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Engine-level failure (connection, query, constraint, index).
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Malformed or missing field. Nothing was persisted.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A write was interrupted in flight; the row may or may not have
    /// landed. Re-query to learn the actual state.
    #[error("{operation} outcome unknown: {source}")]
    UnknownOutcome {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Classify a write-path failure. A connection that broke while the
/// statement was in flight cannot tell us whether the row landed; every
/// other failure mode means the write definitively did not happen.
pub(crate) fn map_write_err(operation: &'static str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_) => StoreError::UnknownOutcome {
            operation,
            source: e,
        },
        other => StoreError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_failure_maps_to_unknown_outcome() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err = map_write_err("event append", sqlx::Error::from(io));

        assert!(matches!(err, StoreError::UnknownOutcome { .. }));
        let message = err.to_string();
        assert!(message.contains("event append"));
        assert!(message.contains("unknown"));
    }

    #[test]
    fn test_other_failures_map_to_storage() {
        let err = map_write_err("event append", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[test]
    fn test_validation_error_converts() {
        let err: StoreError = ValidationError::Empty("content".to_string()).into();
        assert!(err.to_string().starts_with("validation error"));
    }
}
