//! The sequential generator loop.
//!
//! One tick, one append, one sleep, repeat. The loop never runs two ticks
//! concurrently. The sleep between ticks is raced against the shutdown
//! signal; an append in flight is always allowed to finish.
//!
//! On an append failure the current connection is released and the
//! generator reconnects with the same bounded retry used at startup.
//! Exhausting those retries ends the run.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use weather_types::Reading;

use crate::clock::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::model::{self, GeneratorState};
use crate::random::RandomSource;
use crate::retry::{Lifecycle, RetryPolicy, connect_with_retry};
use crate::store::{LogConnector, ObservationLog};

/// Default pause between ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Tunables for a generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Pause between ticks.
    pub interval: Duration,
    /// Connection retry policy, used at startup and after write failures.
    pub retry: RetryPolicy,
    /// Stop after this many ticks. `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            retry: RetryPolicy::default(),
            max_ticks: None,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The startup connection never succeeded; no data was produced.
    ConnectionExhausted,
    /// Reconnecting after a write failure never succeeded.
    ReconnectExhausted,
    /// The shutdown signal fired.
    Shutdown,
    /// The configured tick limit was reached.
    TickLimit,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed (each produced one reading).
    pub ticks: u64,
    /// Readings durably appended.
    pub observations_written: u64,
    /// Appends that failed and were rolled back.
    pub write_failures: u64,
    /// Successful reconnections after a write failure.
    pub reconnects: u64,
    /// Why the run ended.
    pub end_reason: EndReason,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: u64,
    written: u64,
    write_failures: u64,
    reconnects: u64,
}

impl Counters {
    const fn finish(&self, end_reason: EndReason) -> RunSummary {
        RunSummary {
            ticks: self.ticks,
            observations_written: self.written,
            write_failures: self.write_failures,
            reconnects: self.reconnects,
            end_reason,
        }
    }
}

/// The weather generator: model state plus its storage lifecycle.
pub struct Generator<C, R> {
    connector: C,
    random: R,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    settings: GeneratorSettings,
    state: GeneratorState,
    lifecycle: Lifecycle,
}

impl<C: LogConnector, R: RandomSource> Generator<C, R> {
    /// A generator on the system clock and the tokio timer.
    pub fn new(connector: C, random: R, settings: GeneratorSettings) -> Self {
        Self {
            connector,
            random,
            clock: Arc::new(SystemClock),
            sleeper: Arc::new(TokioSleeper),
            settings,
            state: GeneratorState::new(),
            lifecycle: Lifecycle::start(),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The continuity state.
    pub const fn state(&self) -> &GeneratorState {
        &self.state
    }

    /// The current lifecycle state.
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The storage connector.
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Run one step of the model without touching storage.
    pub fn tick(&mut self) -> Reading {
        let hour = self.clock.hour_of_day();
        model::generate_reading(&mut self.state, hour, &mut self.random)
    }

    /// Drive the generator until shutdown, a tick limit, or retry
    /// exhaustion. The storage connection is always released on return.
    pub async fn run<F>(&mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut counters = Counters::default();

        info!(
            interval_secs = self.settings.interval.as_secs(),
            max_attempts = self.settings.retry.max_attempts(),
            retry_delay_secs = self.settings.retry.delay().as_secs(),
            "Weather generator starting"
        );

        self.lifecycle = Lifecycle::start();
        let connected = tokio::select! {
            result = connect_with_retry(
                &self.connector,
                &self.settings.retry,
                self.sleeper.as_ref(),
                &mut self.lifecycle,
            ) => result,
            () = &mut shutdown => {
                info!("Shutdown requested while connecting");
                return counters.finish(EndReason::Shutdown);
            }
        };

        let mut log = match connected {
            Ok(log) => Some(log),
            Err(e) => {
                error!(error = %e, "Generator terminating without producing data");
                return counters.finish(EndReason::ConnectionExhausted);
            }
        };

        info!("Starting data generation");

        let end_reason = loop {
            let Some(active) = log.as_ref() else {
                break EndReason::ReconnectExhausted;
            };

            let reading = self.tick();
            counters.ticks = counters.ticks.saturating_add(1);

            let appended = active.append(reading).await;
            match appended {
                Ok(obs) => {
                    counters.written = counters.written.saturating_add(1);
                    info!(
                        id = %obs.id,
                        temperature = obs.temperature,
                        humidity = obs.humidity,
                        pressure = obs.pressure,
                        wind_speed = obs.wind_speed,
                        condition = %obs.weather_condition,
                        "Generated observation"
                    );
                }
                Err(e) => {
                    counters.write_failures = counters.write_failures.saturating_add(1);
                    warn!(error = %e, "Failed to append observation, attempting to reconnect");

                    if let Some(stale) = log.take() {
                        stale.close().await;
                    }
                    self.lifecycle = self.lifecycle.on_write_failed();

                    let reconnected = tokio::select! {
                        result = connect_with_retry(
                            &self.connector,
                            &self.settings.retry,
                            self.sleeper.as_ref(),
                            &mut self.lifecycle,
                        ) => result,
                        () = &mut shutdown => break EndReason::Shutdown,
                    };

                    match reconnected {
                        Ok(fresh) => {
                            counters.reconnects = counters.reconnects.saturating_add(1);
                            log = Some(fresh);
                        }
                        Err(e) => {
                            error!(error = %e, "Reconnect failed, stopping generation");
                            break EndReason::ReconnectExhausted;
                        }
                    }
                }
            }

            if self
                .settings
                .max_ticks
                .is_some_and(|limit| counters.ticks >= limit)
            {
                info!(ticks = counters.ticks, "Tick limit reached");
                break EndReason::TickLimit;
            }

            tokio::select! {
                () = self.sleeper.sleep(self.settings.interval) => {}
                () = &mut shutdown => {
                    info!("Stopping data generation");
                    break EndReason::Shutdown;
                }
            }
        };

        if let Some(active) = log {
            active.close().await;
            info!("Observation log connection closed");
        }
        if end_reason == EndReason::ReconnectExhausted {
            self.lifecycle = Lifecycle::Terminated;
        }

        let summary = counters.finish(end_reason);
        info!(
            ticks = summary.ticks,
            written = summary.observations_written,
            write_failures = summary.write_failures,
            reconnects = summary.reconnects,
            end_reason = ?summary.end_reason,
            "Weather generator stopped"
        );
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::{TimeDelta, TimeZone, Utc};
    use futures::future::BoxFuture;

    use super::*;
    use crate::aggregate::summarize;
    use crate::clock::{ManualClock, RecordingSleeper};
    use crate::memory::{MemoryConnector, MemoryLog};
    use crate::model::diurnal_base;
    use crate::random::{RngSource, ScriptedRandom};
    use crate::store::{ObservationQuery, StoreError};

    fn settings(max_ticks: Option<u64>) -> GeneratorSettings {
        GeneratorSettings {
            interval: Duration::from_secs(5),
            retry: RetryPolicy::new(3, Duration::from_secs(5)),
            max_ticks,
        }
    }

    fn afternoon_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 6, 1, 14, 0, 0).unwrap(),
        ))
    }

    fn never() -> impl Future<Output = ()> {
        std::future::pending()
    }

    #[tokio::test]
    async fn three_ticks_at_two_pm() {
        let clock = afternoon_clock();
        let log = MemoryLog::with_clock(clock.clone());
        let sleeper = Arc::new(RecordingSleeper::with_clock(clock.clone()));
        let mut generator = Generator::new(
            MemoryConnector::new(log.clone()),
            RngSource::seeded(14),
            settings(Some(3)),
        )
        .with_clock(clock.clone())
        .with_sleeper(sleeper.clone());

        let summary = generator.run(never()).await;

        assert_eq!(summary.end_reason, EndReason::TickLimit);
        assert_eq!(summary.observations_written, 3);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(5); 2]);
        assert_eq!(log.close_count(), 1);

        let stored = log.observations().await;
        let base = diurnal_base(14);
        for obs in &stored {
            assert!((obs.temperature - base).abs() <= 3.0 + 0.005);
        }

        let latest = log.latest().await.unwrap().unwrap();
        assert_eq!(latest, stored[2]);

        let history = log.history(TimeDelta::hours(1)).await.unwrap();
        assert_eq!(history, stored);

        let stats = log.stats(TimeDelta::hours(24)).await.unwrap();
        let temps: Vec<f64> = stored.iter().map(|o| o.temperature).collect();
        let avg = temps.iter().sum::<f64>() / 3.0;
        let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
        let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((stats.temperature.avg - avg).abs() < 1e-9);
        assert!((stats.temperature.min - min).abs() < 1e-9);
        assert!((stats.temperature.max - max).abs() < 1e-9);
        assert_eq!(stats, summarize(&stored));
    }

    #[tokio::test]
    async fn unreachable_store_produces_no_data() {
        let log = MemoryLog::new();
        let sleeper = Arc::new(RecordingSleeper::new());
        let mut generator = Generator::new(
            MemoryConnector::new(log.clone()).refusing(u32::MAX),
            ScriptedRandom::new(),
            settings(None),
        )
        .with_sleeper(sleeper.clone());

        let summary = generator.run(never()).await;

        assert_eq!(summary.end_reason, EndReason::ConnectionExhausted);
        assert_eq!(summary.ticks, 0);
        assert_eq!(generator.connector().attempts(), 3);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(5); 2]);
        assert_eq!(generator.lifecycle(), Lifecycle::Terminated);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn write_failure_reconnects_and_continues() {
        let log = MemoryLog::new();
        log.fail_next_appends(1);
        let mut generator = Generator::new(
            MemoryConnector::new(log.clone()),
            RngSource::seeded(1),
            settings(Some(3)),
        )
        .with_sleeper(Arc::new(RecordingSleeper::new()));

        let summary = generator.run(never()).await;

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.write_failures, 1);
        assert_eq!(summary.reconnects, 1);
        assert_eq!(summary.observations_written, 2);
        assert_eq!(log.len().await, 2);
        assert_eq!(generator.connector().attempts(), 2);
        // The failed connection and the final one were both released.
        assert_eq!(log.close_count(), 2);
        assert_eq!(generator.lifecycle(), Lifecycle::Running);
    }

    /// Connects once, then refuses every later attempt.
    struct OneShotConnector {
        log: MemoryLog,
        attempts: AtomicU32,
    }

    impl LogConnector for OneShotConnector {
        type Log = MemoryLog;

        fn connect(&self) -> BoxFuture<'_, Result<Self::Log, StoreError>> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if attempt == 0 {
                    Ok(self.log.clone())
                } else {
                    Err(StoreError::Connection(String::from("gone")))
                }
            })
        }
    }

    #[tokio::test]
    async fn exhausted_reconnect_ends_the_run() {
        let log = MemoryLog::new();
        log.fail_next_appends(1);
        let connector = OneShotConnector {
            log: log.clone(),
            attempts: AtomicU32::new(0),
        };
        let mut generator = Generator::new(connector, RngSource::seeded(2), settings(None))
            .with_sleeper(Arc::new(RecordingSleeper::new()));

        let summary = generator.run(never()).await;

        assert_eq!(summary.end_reason, EndReason::ReconnectExhausted);
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.observations_written, 0);
        // One successful connect plus three failed reconnects.
        assert_eq!(generator.connector().attempts.load(Ordering::SeqCst), 4);
        assert_eq!(generator.lifecycle(), Lifecycle::Terminated);
        assert_eq!(log.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_sleep() {
        let log = MemoryLog::new();
        let mut generator = Generator::new(
            MemoryConnector::new(log.clone()),
            RngSource::seeded(3),
            GeneratorSettings {
                interval: Duration::from_secs(3_600),
                ..settings(None)
            },
        );

        let summary = generator
            .run(tokio::time::sleep(Duration::from_secs(60)))
            .await;

        assert_eq!(summary.end_reason, EndReason::Shutdown);
        assert_eq!(summary.observations_written, 1);
        assert_eq!(log.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_startup_connect() {
        let log = MemoryLog::new();
        let mut generator = Generator::new(
            MemoryConnector::new(log.clone()).refusing(u32::MAX),
            RngSource::seeded(4),
            settings(None),
        );

        let summary = generator
            .run(tokio::time::sleep(Duration::from_secs(2)))
            .await;

        assert_eq!(summary.end_reason, EndReason::Shutdown);
        assert_eq!(summary.ticks, 0);
        // Interrupted during the first retry pause.
        assert_eq!(generator.connector().attempts(), 1);
        assert!(log.is_empty().await);
        assert_eq!(log.close_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_reconnect() {
        let log = MemoryLog::new();
        log.fail_next_appends(1);
        let connector = OneShotConnector {
            log: log.clone(),
            attempts: AtomicU32::new(0),
        };
        let mut generator = Generator::new(connector, RngSource::seeded(5), settings(None));

        let summary = generator
            .run(tokio::time::sleep(Duration::from_secs(2)))
            .await;

        assert_eq!(summary.end_reason, EndReason::Shutdown);
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.write_failures, 1);
        assert_eq!(summary.reconnects, 0);
        // The first connect plus one refused reconnect before the pause.
        assert_eq!(generator.connector().attempts.load(Ordering::SeqCst), 2);
        // Only the stale connection existed to release.
        assert_eq!(log.close_count(), 1);
        assert!(log.is_empty().await);
    }

    #[test]
    fn tick_advances_only_pressure_state() {
        let mut generator = Generator::new(
            MemoryConnector::new(MemoryLog::new()),
            ScriptedRandom::new().with_uniforms([0.0, 0.0, -1.0]),
            settings(None),
        )
        .with_clock(afternoon_clock());

        let reading = generator.tick();
        assert!((reading.pressure - 1012.25).abs() < 1e-9);
        assert!((generator.state().previous_pressure() - 1012.25).abs() < 1e-9);
    }
}
