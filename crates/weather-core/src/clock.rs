//! Wall-clock and sleep seams.
//!
//! The generator reads the hour of day to drive the diurnal temperature
//! curve and sleeps between ticks and between connection attempts. Both go
//! through traits so tests can pin the hour and skip real delays.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Timelike, Utc};
use futures::future::BoxFuture;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The wall-clock hour of day, `0..=23`.
    fn hour_of_day(&self) -> u32;
}

/// The process's real clock. The hour of day is taken in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn hour_of_day(&self) -> u32 {
        Local::now().hour()
    }
}

/// A manually driven clock.
///
/// The hour of day is derived from the current instant in UTC, so tests
/// that care about the diurnal curve should start the clock at the hour
/// they want.
#[derive(Debug)]
pub struct ManualClock {
    now_millis: AtomicI64,
}

impl ManualClock {
    /// A clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let millis = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Move the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.now_millis
            .store(instant.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn hour_of_day(&self) -> u32 {
        self.now().hour()
    }
}

/// Asynchronous sleep.
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Records requested sleeps and returns immediately.
///
/// When attached to a [`ManualClock`], each sleep also advances the clock
/// by the requested duration.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
    clock: Option<Arc<ManualClock>>,
}

impl RecordingSleeper {
    /// A sleeper that only records.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sleeper that records and advances `clock`.
    pub fn with_clock(clock: Arc<ManualClock>) -> Self {
        Self {
            slept: Mutex::new(Vec::new()),
            clock: Some(clock),
        }
    }

    /// Every duration requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|slept| slept.clone())
            .unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
        Box::pin(async {
            tokio::task::yield_now().await;
        })
    }
}

/// Longest trailing window accepted, in hours (a little over 114 years).
///
/// `PostgreSQL` rejects cutoffs far outside its timestamp range, so every
/// backend is held to the same bound.
pub const MAX_WINDOW_HOURS: i64 = 1_000_000;

/// Convert a window length to a [`TimeDelta`], rejecting negative values
/// and anything beyond [`MAX_WINDOW_HOURS`].
pub fn window_from_hours(hours: i64) -> Option<TimeDelta> {
    if !(0..=MAX_WINDOW_HOURS).contains(&hours) {
        return None;
    }
    TimeDelta::try_hours(hours)
}
