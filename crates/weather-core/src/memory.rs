//! In-memory observation log.
//!
//! [`MemoryLog`] implements both sides of the storage seam: the generator
//! can append to it and the observer can query it. It backs the observer's
//! API tests and the generator loop tests, and can inject append and
//! connection failures to exercise the retry paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::TimeDelta;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use weather_types::{Observation, ObservationId, Reading, WindowStats};

use crate::aggregate::{in_window, summarize_window};
use crate::clock::{Clock, SystemClock};
use crate::store::{LogConnector, ObservationLog, ObservationQuery, StoreError};

/// Decrement a failure budget, returning whether a failure should fire.
fn take_failure(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Append-only observation log held in process memory.
///
/// Cloning yields another handle to the same log.
#[derive(Clone)]
pub struct MemoryLog {
    rows: Arc<RwLock<Vec<Observation>>>,
    clock: Arc<dyn Clock>,
    failing_appends: Arc<AtomicU32>,
    failing_queries: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
}

impl MemoryLog {
    /// An empty log stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// An empty log stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            clock,
            failing_appends: Arc::new(AtomicU32::new(0)),
            failing_queries: Arc::new(AtomicU32::new(0)),
            closes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Make the next `count` appends fail.
    pub fn fail_next_appends(&self, count: u32) {
        self.failing_appends.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` queries fail.
    pub fn fail_next_queries(&self, count: u32) {
        self.failing_queries.store(count, Ordering::SeqCst);
    }

    /// Insert an observation with a caller-chosen timestamp.
    ///
    /// Used to seed history; the identifier is still assigned by the log.
    pub async fn insert_at(
        &self,
        timestamp: chrono::DateTime<chrono::Utc>,
        reading: Reading,
    ) -> Observation {
        let mut rows = self.rows.write().await;
        let id = rows.last().map_or(ObservationId(1), |last| last.id.next());
        let obs = Observation::from_reading(id, timestamp, reading);
        rows.push(obs.clone());
        obs
    }

    /// Snapshot of every stored observation in append order.
    pub async fn observations(&self) -> Vec<Observation> {
        self.rows.read().await.clone()
    }

    /// Number of stored observations.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the log holds no observations.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// How many times a handle to this log was closed.
    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    fn check_query(&self) -> Result<(), StoreError> {
        if take_failure(&self.failing_queries) {
            return Err(StoreError::Query(String::from("injected query failure")));
        }
        Ok(())
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLog").finish_non_exhaustive()
    }
}

impl ObservationLog for MemoryLog {
    fn append(&self, reading: Reading) -> BoxFuture<'_, Result<Observation, StoreError>> {
        Box::pin(async move {
            if take_failure(&self.failing_appends) {
                return Err(StoreError::Write(String::from("injected append failure")));
            }

            let mut rows = self.rows.write().await;
            let now = self.clock.now();
            let (id, timestamp) = match rows.last() {
                Some(last) => (last.id.next(), now.max(last.timestamp)),
                None => (ObservationId(1), now),
            };
            let obs = Observation::from_reading(id, timestamp, reading);
            rows.push(obs.clone());
            Ok(obs)
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {})
    }
}

impl ObservationQuery for MemoryLog {
    fn latest(&self) -> BoxFuture<'_, Result<Option<Observation>, StoreError>> {
        Box::pin(async move {
            self.check_query()?;
            let rows = self.rows.read().await;
            Ok(rows.iter().max_by_key(|obs| (obs.timestamp, obs.id)).cloned())
        })
    }

    fn history(&self, window: TimeDelta) -> BoxFuture<'_, Result<Vec<Observation>, StoreError>> {
        Box::pin(async move {
            self.check_query()?;
            let now = self.clock.now();
            let rows = self.rows.read().await;
            let mut matching: Vec<Observation> = rows
                .iter()
                .filter(|obs| in_window(obs.timestamp, now, window))
                .cloned()
                .collect();
            matching.sort_by_key(|obs| (obs.timestamp, obs.id));
            Ok(matching)
        })
    }

    fn stats(&self, window: TimeDelta) -> BoxFuture<'_, Result<WindowStats, StoreError>> {
        Box::pin(async move {
            self.check_query()?;
            let now = self.clock.now();
            let rows = self.rows.read().await;
            Ok(summarize_window(&rows, now, window))
        })
    }
}

/// [`LogConnector`] handing out handles to one [`MemoryLog`].
#[derive(Debug)]
pub struct MemoryConnector {
    log: MemoryLog,
    refusals: AtomicU32,
    attempts: AtomicU32,
}

impl MemoryConnector {
    /// A connector that always succeeds.
    pub const fn new(log: MemoryLog) -> Self {
        Self {
            log,
            refusals: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    /// Refuse the next `count` connection attempts.
    #[must_use]
    pub fn refusing(self, count: u32) -> Self {
        self.refusals.store(count, Ordering::SeqCst);
        self
    }

    /// Refuse the next `count` connection attempts, from now on.
    pub fn refuse_next(&self, count: u32) {
        self.refusals.store(count, Ordering::SeqCst);
    }

    /// Total connection attempts made.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The log this connector hands out.
    pub const fn log(&self) -> &MemoryLog {
        &self.log
    }
}

impl LogConnector for MemoryConnector {
    type Log = MemoryLog;

    fn connect(&self) -> BoxFuture<'_, Result<Self::Log, StoreError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let refused = take_failure(&self.refusals);
        Box::pin(async move {
            if refused {
                return Err(StoreError::Connection(String::from("connection refused")));
            }
            Ok(self.log.clone())
        })
    }
}
