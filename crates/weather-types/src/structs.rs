//! Core data structs for the weather station.
//!
//! A [`Reading`] is what the generator produces each tick. The observation
//! log turns it into an [`Observation`] by assigning an identifier and an
//! append timestamp. [`WindowStats`] is the aggregate projection served by
//! the stats endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::WeatherCondition;
use crate::ids::ObservationId;

/// Lower bound of the temperature range, in degrees Celsius.
pub const TEMPERATURE_MIN: f64 = -50.0;
/// Upper bound of the temperature range, in degrees Celsius.
pub const TEMPERATURE_MAX: f64 = 50.0;
/// Lower bound of relative humidity, in percent.
pub const HUMIDITY_MIN: f64 = 0.0;
/// Upper bound of relative humidity, in percent.
pub const HUMIDITY_MAX: f64 = 100.0;
/// Lower bound of barometric pressure, in hectopascals.
pub const PRESSURE_MIN: f64 = 950.0;
/// Upper bound of barometric pressure, in hectopascals.
pub const PRESSURE_MAX: f64 = 1050.0;
/// Lower bound of wind speed, in metres per second.
pub const WIND_SPEED_MIN: f64 = 0.0;
/// Upper bound of wind speed, in metres per second.
pub const WIND_SPEED_MAX: f64 = 50.0;
/// Lower bound of wind direction, in degrees.
pub const WIND_DIRECTION_MIN: i32 = 0;
/// Upper bound of wind direction, in degrees (inclusive).
pub const WIND_DIRECTION_MAX: i32 = 360;

/// The generated fields of one tick, before the log assigns identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Barometric pressure in hectopascals.
    pub pressure: f64,
    /// Wind speed in metres per second.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: i32,
    /// Classified sky condition.
    pub weather_condition: WeatherCondition,
}

impl Reading {
    /// Whether every field lies within its declared bound (inclusive).
    pub fn is_within_bounds(&self) -> bool {
        (TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&self.temperature)
            && (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&self.humidity)
            && (PRESSURE_MIN..=PRESSURE_MAX).contains(&self.pressure)
            && (WIND_SPEED_MIN..=WIND_SPEED_MAX).contains(&self.wind_speed)
            && (WIND_DIRECTION_MIN..=WIND_DIRECTION_MAX).contains(&self.wind_direction)
    }
}

/// One immutable weather observation as stored in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Observation {
    /// Log-assigned identifier.
    pub id: ObservationId,
    /// Log-append time.
    pub timestamp: DateTime<Utc>,
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Barometric pressure in hectopascals.
    pub pressure: f64,
    /// Wind speed in metres per second.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: i32,
    /// Classified sky condition.
    pub weather_condition: WeatherCondition,
}

impl Observation {
    /// Attach log identity to a generated reading.
    pub const fn from_reading(
        id: ObservationId,
        timestamp: DateTime<Utc>,
        reading: Reading,
    ) -> Self {
        Self {
            id,
            timestamp,
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
            wind_speed: reading.wind_speed,
            wind_direction: reading.wind_direction,
            weather_condition: reading.weather_condition,
        }
    }

    /// The generated fields of this observation.
    pub const fn reading(&self) -> Reading {
        Reading {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            weather_condition: self.weather_condition,
        }
    }
}

/// Average, minimum, and maximum of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RangeStats {
    /// Arithmetic mean.
    pub avg: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

/// Average and maximum of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PeakStats {
    /// Arithmetic mean.
    pub avg: f64,
    /// Largest value.
    pub max: f64,
}

/// Aggregates over the observations of a trailing time window.
///
/// Every aggregate is `0` when the window is empty. `sample_count == 0` is
/// the explicit no-data marker; callers must not infer emptiness from the
/// zeroed aggregates since a real reading can be zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WindowStats {
    /// Temperature aggregates.
    pub temperature: RangeStats,
    /// Humidity aggregates.
    pub humidity: RangeStats,
    /// Pressure aggregates.
    pub pressure: RangeStats,
    /// Wind speed aggregates.
    pub wind_speed: PeakStats,
    /// Number of observations aggregated.
    pub sample_count: u64,
}

impl WindowStats {
    /// The all-zero result for a window with no observations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the window held no observations.
    pub const fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reading() -> Reading {
        Reading {
            temperature: 21.5,
            humidity: 48.25,
            pressure: 1012.0,
            wind_speed: 7.1,
            wind_direction: 180,
            weather_condition: WeatherCondition::Sunny,
        }
    }

    #[test]
    fn boundary_values_are_within_bounds() {
        let edge = Reading {
            temperature: TEMPERATURE_MIN,
            humidity: HUMIDITY_MAX,
            pressure: PRESSURE_MAX,
            wind_speed: WIND_SPEED_MIN,
            wind_direction: WIND_DIRECTION_MAX,
            weather_condition: WeatherCondition::Snowy,
        };
        assert!(edge.is_within_bounds());
    }

    #[test]
    fn out_of_range_pressure_is_rejected() {
        let bad = Reading {
            pressure: 949.99,
            ..reading()
        };
        assert!(!bad.is_within_bounds());
    }

    #[test]
    fn observation_preserves_reading() {
        let obs = Observation::from_reading(ObservationId(3), Utc::now(), reading());
        assert_eq!(obs.reading(), reading());
        assert_eq!(obs.id, ObservationId(3));
    }

    #[test]
    fn observation_json_shape() {
        let obs = Observation::from_reading(ObservationId(1), Utc::now(), reading());
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["weather_condition"], "sunny");
        assert_eq!(json["wind_direction"], 180);
        assert!(json["timestamp"].is_string());
        assert!(json["temperature"].is_f64());
    }

    #[test]
    fn empty_stats_are_zero_with_marker() {
        let stats = WindowStats::empty();
        assert!(stats.is_empty());
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["temperature"]["avg"], 0.0);
        assert_eq!(json["wind_speed"]["max"], 0.0);
        assert!(json["wind_speed"].get("min").is_none());
        assert_eq!(json["sample_count"], 0);
    }
}
