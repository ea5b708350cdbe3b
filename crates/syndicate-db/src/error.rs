//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors. At the trait boundary [`DbError`] is classified into
//! the engine's [`StoreError`] taxonomy.

use syndicate_core::StoreError;

/// `PostgreSQL` SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row violates a domain invariant.
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::Postgres(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Self::Duplicate(db.message().to_owned())
            }
            DbError::Postgres(sqlx::Error::Database(db))
                if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) =>
            {
                Self::Corrupt(err.to_string())
            }
            DbError::Postgres(
                sqlx::Error::ColumnDecode { .. }
                | sqlx::Error::Decode(_)
                | sqlx::Error::ColumnNotFound(_)
                | sqlx::Error::TypeNotFound { .. },
            )
            | DbError::InvalidRow(_) => Self::Corrupt(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rows_are_corrupt() {
        let err = StoreError::from(DbError::InvalidRow("negative cooldown".to_owned()));
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn pool_timeouts_are_unavailable() {
        let err = StoreError::from(DbError::Postgres(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, StoreError::Unavailable(_)));
        let closed = StoreError::from(DbError::Postgres(sqlx::Error::PoolClosed));
        assert!(matches!(closed, StoreError::Unavailable(_)));
    }

    #[test]
    fn decode_failures_are_corrupt() {
        let err = StoreError::from(DbError::Postgres(sqlx::Error::ColumnNotFound(
            "cooldown_secs".to_owned(),
        )));
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
