//! Translation of driver errors into [`StoreError`].

use fest_core::StoreError;

/// `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";
/// `check_violation`
const CHECK_VIOLATION: &str = "23514";
/// `lock_not_available`, raised when `lock_timeout` expires
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `serialization_failure`
const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";
/// `query_canceled`, raised when `statement_timeout` expires
const QUERY_CANCELED: &str = "57014";

/// Map a sqlx error onto the store vocabulary.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => {
            let constraint = db.constraint().unwrap_or_default().to_string();
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => StoreError::UniqueViolation { constraint },
                Some(CHECK_VIOLATION) => StoreError::CheckViolation { constraint },
                Some(LOCK_NOT_AVAILABLE | QUERY_CANCELED) => {
                    metrics::counter!("fest_store_lock_timeouts_total").increment(1);
                    StoreError::LockTimeout
                }
                Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                    StoreError::SerializationFailure(db.message().to_string())
                }
                _ => StoreError::Database(db.message().to_string()),
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn missing_rows_are_database_errors() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
