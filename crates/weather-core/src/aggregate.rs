//! Windowed statistics over observations.
//!
//! [`summarize`] is the reference for the stats projection: the
//! `PostgreSQL` store computes the same `AVG`/`MIN`/`MAX` figures in SQL,
//! and the in-memory log calls this directly.

use chrono::{DateTime, TimeDelta, Utc};
use weather_types::{Observation, PeakStats, RangeStats, WindowStats};

/// Whether `timestamp` falls in the trailing window ending at `now`.
///
/// The lower edge is exclusive: an observation exactly `window` old is
/// outside.
pub fn in_window(timestamp: DateTime<Utc>, now: DateTime<Utc>, window: TimeDelta) -> bool {
    now.checked_sub_signed(window)
        .is_none_or(|cutoff| timestamp > cutoff)
}

/// Running accumulator for one metric.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    const fn new() -> Self {
        Self {
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, value: f64) {
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    #[allow(clippy::cast_precision_loss)]
    fn range(self, count: usize) -> RangeStats {
        if count == 0 {
            return RangeStats::default();
        }
        RangeStats {
            avg: self.sum / count as f64,
            min: self.min,
            max: self.max,
        }
    }

    fn peak(self, count: usize) -> PeakStats {
        let range = self.range(count);
        PeakStats {
            avg: range.avg,
            max: range.max,
        }
    }
}

/// Aggregate every observation in `observations`.
///
/// Averages, minima, and maxima of temperature, humidity, and pressure;
/// average and maximum of wind speed. Every figure is `0` for an empty
/// slice and `sample_count` records how many observations contributed.
pub fn summarize(observations: &[Observation]) -> WindowStats {
    let mut temperature = Accumulator::new();
    let mut humidity = Accumulator::new();
    let mut pressure = Accumulator::new();
    let mut wind_speed = Accumulator::new();

    for obs in observations {
        temperature.push(obs.temperature);
        humidity.push(obs.humidity);
        pressure.push(obs.pressure);
        wind_speed.push(obs.wind_speed);
    }

    let count = observations.len();
    WindowStats {
        temperature: temperature.range(count),
        humidity: humidity.range(count),
        pressure: pressure.range(count),
        wind_speed: wind_speed.peak(count),
        sample_count: u64::try_from(count).unwrap_or(u64::MAX),
    }
}

/// Aggregate the observations in the trailing window ending at `now`.
pub fn summarize_window(
    observations: &[Observation],
    now: DateTime<Utc>,
    window: TimeDelta,
) -> WindowStats {
    let in_range: Vec<Observation> = observations
        .iter()
        .filter(|obs| in_window(obs.timestamp, now, window))
        .cloned()
        .collect();
    summarize(&in_range)
}
