//! Storage traits and the storage error taxonomy.
//!
//! The observation log is an append-only collection keyed by a
//! log-assigned, increasing identifier. The generator writes to it through
//! [`LogConnector`] and [`ObservationLog`]; the observer reads from it
//! through [`ObservationQuery`].
//!
//! "No rows" is never an error: [`ObservationQuery::latest`] returns
//! `None` and [`ObservationQuery::stats`] returns a [`WindowStats`] whose
//! `sample_count` is zero.

use chrono::TimeDelta;
use futures::future::BoxFuture;
use weather_types::{Observation, Reading, WindowStats};

/// Length of the trailing stats window, in hours.
pub const STATS_WINDOW_HOURS: i64 = 24;

/// Trailing window used by the stats projection.
pub fn stats_window() -> TimeDelta {
    TimeDelta::hours(STATS_WINDOW_HOURS)
}

/// Failures reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An append failed and was rolled back.
    #[error("write failed: {0}")]
    Write(String),

    /// A read or aggregate query failed.
    #[error("query failed: {0}")]
    Query(String),
}

/// Establishes connections to the observation log.
pub trait LogConnector: Send + Sync {
    /// The connected log handle.
    type Log: ObservationLog;

    /// Open one connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the store is unreachable.
    fn connect(&self) -> BoxFuture<'_, Result<Self::Log, StoreError>>;
}

/// A connected, writable observation log.
pub trait ObservationLog: Send + Sync {
    /// Append one reading as a single atomic write.
    ///
    /// The log assigns the identifier and the append timestamp. On failure
    /// nothing is visible to readers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] when the append was rolled back.
    fn append(&self, reading: Reading) -> BoxFuture<'_, Result<Observation, StoreError>>;

    /// Release the connection.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Read-only views over the observation log.
///
/// Implementations hold no per-request state and must tolerate concurrent
/// calls alongside appends.
pub trait ObservationQuery: Send + Sync {
    /// The most recently appended observation, or `None` for an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the read fails.
    fn latest(&self) -> BoxFuture<'_, Result<Option<Observation>, StoreError>>;

    /// Observations with `timestamp > now - window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the read fails.
    fn history(&self, window: TimeDelta) -> BoxFuture<'_, Result<Vec<Observation>, StoreError>>;

    /// Aggregates over observations with `timestamp > now - window`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the aggregate fails.
    fn stats(&self, window: TimeDelta) -> BoxFuture<'_, Result<WindowStats, StoreError>>;
}
