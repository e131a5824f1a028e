//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors. At the storage seam they are converted into the
//! [`StoreError`] kind matching the operation that failed.

use weather_core::StoreError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned into a domain value.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Report this error as a failed connection.
    pub fn into_connection(self) -> StoreError {
        StoreError::Connection(self.to_string())
    }

    /// Report this error as a rolled-back write.
    pub fn into_write(self) -> StoreError {
        StoreError::Write(self.to_string())
    }

    /// Report this error as a failed read.
    pub fn into_query(self) -> StoreError {
        StoreError::Query(self.to_string())
    }
}
