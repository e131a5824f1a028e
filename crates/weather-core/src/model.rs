//! The per-tick weather model.
//!
//! A tick computes its fields in a fixed order because later quantities
//! depend on earlier ones:
//!
//! 1. Temperature from a diurnal sinusoid plus noise.
//! 2. Humidity, inversely related to temperature.
//! 3. Pressure, a bounded random walk carried in [`GeneratorState`].
//! 4. Wind speed, a half-normal draw.
//! 5. Wind direction, uniform over the compass.
//! 6. The condition, classified from humidity and temperature.
//!
//! Pressure is the only history-dependent quantity. Everything else is
//! memoryless given the tick's hour and the draws.

use std::f64::consts::PI;

use weather_types::structs::{
    HUMIDITY_MAX, HUMIDITY_MIN, PRESSURE_MAX, PRESSURE_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
    WIND_DIRECTION_MAX, WIND_DIRECTION_MIN, WIND_SPEED_MAX, WIND_SPEED_MIN,
};
use weather_types::{Reading, WeatherCondition};

use crate::random::RandomSource;

/// Pressure the random walk starts from, in hectopascals.
pub const INITIAL_PRESSURE: f64 = 1013.25;

/// Largest single pressure step, in either direction.
pub const PRESSURE_STEP: f64 = 2.0;

/// Half-width of the uniform temperature noise.
const TEMPERATURE_NOISE: f64 = 3.0;

/// Half-width of the uniform humidity noise.
const HUMIDITY_NOISE: f64 = 10.0;

/// Mean of the wind speed draw, before taking the magnitude.
const WIND_SPEED_MEAN: f64 = 10.0;

/// Standard deviation of the wind speed draw.
const WIND_SPEED_STD_DEV: f64 = 5.0;

/// Continuity state carried from one tick to the next.
///
/// Owned exclusively by the generator and lost on restart; a restarted
/// generator resumes the walk from [`INITIAL_PRESSURE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorState {
    previous_pressure: f64,
}

impl GeneratorState {
    /// State at process start.
    pub const fn new() -> Self {
        Self::with_pressure(INITIAL_PRESSURE)
    }

    /// State resuming from a known pressure.
    pub const fn with_pressure(previous_pressure: f64) -> Self {
        Self { previous_pressure }
    }

    /// The unrounded pressure the next step starts from.
    pub const fn previous_pressure(&self) -> f64 {
        self.previous_pressure
    }

    /// Advance the walk by one step drawn from `random`.
    ///
    /// Returns the tick's pressure reading, rounded to 2 decimals.
    pub fn advance_pressure(&mut self, random: &mut dyn RandomSource) -> f64 {
        let delta = random.uniform(-PRESSURE_STEP, PRESSURE_STEP);
        self.previous_pressure = step_pressure(self.previous_pressure, delta);
        round2(self.previous_pressure)
    }
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::new()
    }
}

/// One random-walk step: add `delta` and clamp to the pressure bounds.
///
/// The clamped value is what the walk continues from, so a walk pinned at
/// a bound has to step back inward before it can drift again.
pub fn step_pressure(previous: f64, delta: f64) -> f64 {
    (previous + delta).clamp(PRESSURE_MIN, PRESSURE_MAX)
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Noise-free temperature for an hour of the day.
///
/// Peaks at 25 °C at 12:00 and bottoms out at 5 °C at midnight.
pub fn diurnal_base(hour: u32) -> f64 {
    let phase = 2.0 * PI * (f64::from(hour) - 6.0) / 24.0;
    10.0f64.mul_add(phase.sin(), 15.0)
}

/// Temperature for the tick, in degrees Celsius.
pub fn temperature(hour: u32, random: &mut dyn RandomSource) -> f64 {
    let noise = random.uniform(-TEMPERATURE_NOISE, TEMPERATURE_NOISE);
    round2((diurnal_base(hour) + noise).clamp(TEMPERATURE_MIN, TEMPERATURE_MAX))
}

/// Relative humidity for the tick, in percent.
pub fn humidity(temperature: f64, random: &mut dyn RandomSource) -> f64 {
    let base = 1.5f64.mul_add(-temperature, 80.0);
    let noise = random.uniform(-HUMIDITY_NOISE, HUMIDITY_NOISE);
    round2((base + noise).clamp(HUMIDITY_MIN, HUMIDITY_MAX))
}

/// Wind speed for the tick, in metres per second.
pub fn wind_speed(random: &mut dyn RandomSource) -> f64 {
    let speed = random.normal(WIND_SPEED_MEAN, WIND_SPEED_STD_DEV).abs();
    round2(speed.clamp(WIND_SPEED_MIN, WIND_SPEED_MAX))
}

/// Wind direction for the tick, in whole degrees.
pub fn wind_direction(random: &mut dyn RandomSource) -> i32 {
    random
        .int_inclusive(WIND_DIRECTION_MIN, WIND_DIRECTION_MAX)
        .clamp(WIND_DIRECTION_MIN, WIND_DIRECTION_MAX)
}

/// The outcome of the classification rules for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionRule {
    /// The condition is fully determined.
    Fixed(WeatherCondition),
    /// A fair choice between two conditions.
    Either(WeatherCondition, WeatherCondition),
}

impl ConditionRule {
    /// Apply the priority-ordered rules; the first match wins.
    pub fn for_reading(temperature: f64, humidity: f64) -> Self {
        if humidity > 80.0 && temperature < 5.0 {
            Self::Fixed(WeatherCondition::Snowy)
        } else if humidity > 70.0 {
            Self::Fixed(WeatherCondition::Rainy)
        } else if humidity < 40.0 {
            Self::Fixed(WeatherCondition::Sunny)
        } else if humidity < 60.0 {
            Self::Either(WeatherCondition::Sunny, WeatherCondition::PartlyCloudy)
        } else {
            Self::Either(WeatherCondition::Cloudy, WeatherCondition::PartlyCloudy)
        }
    }

    /// Every condition this rule can produce.
    pub fn candidates(self) -> Vec<WeatherCondition> {
        match self {
            Self::Fixed(c) => vec![c],
            Self::Either(a, b) => vec![a, b],
        }
    }

    /// Pick the condition, flipping a coin for a two-way rule.
    pub fn resolve(self, random: &mut dyn RandomSource) -> WeatherCondition {
        match self {
            Self::Fixed(c) => c,
            Self::Either(a, b) => {
                if random.coin() {
                    a
                } else {
                    b
                }
            }
        }
    }
}

/// Classify the sky condition from humidity and temperature.
pub fn classify(
    temperature: f64,
    humidity: f64,
    random: &mut dyn RandomSource,
) -> WeatherCondition {
    ConditionRule::for_reading(temperature, humidity).resolve(random)
}

/// Run one tick of the model.
///
/// `hour` is the wall-clock hour of day (0-23). Mutates `state` through
/// the pressure walk and returns the tick's reading.
pub fn generate_reading(
    state: &mut GeneratorState,
    hour: u32,
    random: &mut dyn RandomSource,
) -> Reading {
    let temperature = temperature(hour, random);
    let humidity = humidity(temperature, random);
    let pressure = state.advance_pressure(random);
    let wind_speed = wind_speed(random);
    let wind_direction = wind_direction(random);
    let weather_condition = classify(temperature, humidity, random);

    Reading {
        temperature,
        humidity,
        pressure,
        wind_speed,
        wind_direction,
        weather_condition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, ScriptedRandom};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn diurnal_curve_peaks_at_noon() {
        assert!(close(diurnal_base(12), 25.0));
        assert!(close(diurnal_base(0), 5.0));
        assert!(close(diurnal_base(6), 15.0));
        assert!(close(diurnal_base(18), 15.0));
        assert!((diurnal_base(14) - 23.660_254).abs() < 1e-6);
    }

    #[test]
    fn temperature_applies_noise_and_rounds() {
        let mut random = ScriptedRandom::new().with_uniforms([1.234_567]);
        // 25 + 1.234567 -> 26.23
        assert!(close(temperature(12, &mut random), 26.23));
    }

    #[test]
    fn temperature_is_clamped() {
        let mut random = ScriptedRandom::new().with_uniforms([100.0, -100.0]);
        assert!(close(temperature(12, &mut random), 50.0));
        assert!(close(temperature(0, &mut random), -50.0));
    }

    #[test]
    fn humidity_falls_as_temperature_rises() {
        let mut random = ScriptedRandom::new();
        let cool = humidity(0.0, &mut random);
        let warm = humidity(30.0, &mut random);
        assert!(close(cool, 80.0));
        assert!(close(warm, 35.0));
    }

    #[test]
    fn humidity_is_clamped() {
        let mut random = ScriptedRandom::new().with_uniforms([10.0, -10.0]);
        assert!(close(humidity(-40.0, &mut random), 100.0));
        assert!(close(humidity(50.0, &mut random), 0.0));
    }

    #[test]
    fn pressure_walk_feeds_back_clamped_value() {
        let mut state = GeneratorState::with_pressure(1049.0);
        let mut random = ScriptedRandom::new().with_uniforms([2.0, -1.5]);

        let first = state.advance_pressure(&mut random);
        assert!(close(first, 1050.0));
        assert!(close(state.previous_pressure(), 1050.0));

        // The next step starts from the clamped bound, not from 1051.
        let second = state.advance_pressure(&mut random);
        assert!(close(second, 1048.5));
    }

    #[test]
    fn pressure_walk_clamps_at_lower_bound() {
        assert!(close(step_pressure(950.5, -2.0), 950.0));
        assert!(close(step_pressure(1000.0, 1.25), 1001.25));
    }

    #[test]
    fn pressure_starts_from_standard_atmosphere() {
        let mut state = GeneratorState::new();
        let mut random = ScriptedRandom::new();
        assert!(close(state.advance_pressure(&mut random), 1013.25));
    }

    #[test]
    fn wind_speed_is_half_normal() {
        let mut random = ScriptedRandom::new().with_normals([-7.456, 80.0]);
        assert!(close(wind_speed(&mut random), 7.46));
        assert!(close(wind_speed(&mut random), 50.0));
    }

    #[test]
    fn classification_follows_priority_order() {
        use WeatherCondition::{Cloudy, PartlyCloudy, Rainy, Snowy, Sunny};

        assert_eq!(ConditionRule::for_reading(4.99, 80.01), ConditionRule::Fixed(Snowy));
        // Cold but not humid enough for snow falls through to rain.
        assert_eq!(ConditionRule::for_reading(4.0, 75.0), ConditionRule::Fixed(Rainy));
        // Humid but warm is rain.
        assert_eq!(ConditionRule::for_reading(10.0, 85.0), ConditionRule::Fixed(Rainy));
        assert_eq!(ConditionRule::for_reading(30.0, 39.99), ConditionRule::Fixed(Sunny));
        assert_eq!(
            ConditionRule::for_reading(20.0, 40.0),
            ConditionRule::Either(Sunny, PartlyCloudy)
        );
        assert_eq!(
            ConditionRule::for_reading(20.0, 60.0),
            ConditionRule::Either(Cloudy, PartlyCloudy)
        );
        assert_eq!(
            ConditionRule::for_reading(20.0, 70.0),
            ConditionRule::Either(Cloudy, PartlyCloudy)
        );
    }

    #[test]
    fn two_way_rules_use_the_coin() {
        let mut random = ScriptedRandom::new().with_coins([true, false]);
        assert_eq!(classify(20.0, 50.0, &mut random), WeatherCondition::Sunny);
        assert_eq!(classify(20.0, 50.0, &mut random), WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn generated_readings_respect_bounds_and_continuity() {
        let mut state = GeneratorState::new();
        let mut random = RngSource::seeded(2024);
        let mut previous = state.previous_pressure();

        for tick in 0..5_000u32 {
            let hour = tick % 24;
            let reading = generate_reading(&mut state, hour, &mut random);
            assert!(reading.is_within_bounds(), "out of bounds: {reading:?}");

            // Rounding to 2 decimals can add at most half a hundredth.
            assert!((reading.pressure - previous).abs() <= PRESSURE_STEP + 0.005 + 1e-9);
            previous = state.previous_pressure();

            let allowed = ConditionRule::for_reading(reading.temperature, reading.humidity)
                .candidates();
            assert!(allowed.contains(&reading.weather_condition));
        }
    }

    #[test]
    fn tick_draws_in_model_order() {
        let mut state = GeneratorState::new();
        // temperature noise, humidity noise, pressure step
        let mut random = ScriptedRandom::new()
            .with_uniforms([0.0, 0.0, 1.5])
            .with_normals([12.0])
            .with_ints([270])
            .with_coins([false]);

        let reading = generate_reading(&mut state, 12, &mut random);
        assert!(close(reading.temperature, 25.0));
        assert!(close(reading.humidity, 42.5));
        assert!(close(reading.pressure, 1014.75));
        assert!(close(reading.wind_speed, 12.0));
        assert_eq!(reading.wind_direction, 270);
        assert_eq!(reading.weather_condition, WeatherCondition::PartlyCloudy);
    }
}
