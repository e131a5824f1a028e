//! Enumeration types for the weather station.
//!
//! The only enumeration is the derived [`WeatherCondition`]. Its wire form
//! (JSON and the `weather_condition` column) is the lowercase snake-case
//! name, e.g. `partly_cloudy`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Sky condition classified from humidity and temperature at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WeatherCondition {
    /// Dry air, clear sky.
    Sunny,
    /// Mixed sun and cloud.
    PartlyCloudy,
    /// Overcast.
    Cloudy,
    /// Humid enough to rain.
    Rainy,
    /// Humid and cold.
    Snowy,
}

impl WeatherCondition {
    /// All conditions in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Sunny,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Rainy,
        Self::Snowy,
    ];

    /// The `weather_condition` column value for this variant.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
        }
    }
}

impl core::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// A stored condition string did not name a known [`WeatherCondition`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weather condition: {0}")]
pub struct ParseConditionError(pub String);

impl core::str::FromStr for WeatherCondition {
    type Err = ParseConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_db_str() == s)
            .ok_or_else(|| ParseConditionError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn db_strings_parse_back() {
        for condition in WeatherCondition::ALL {
            let parsed: WeatherCondition = condition.as_db_str().parse().unwrap();
            assert_eq!(parsed, condition);
        }
    }

    #[test]
    fn unknown_condition_is_rejected() {
        let err = "foggy".parse::<WeatherCondition>().unwrap_err();
        assert_eq!(err, ParseConditionError(String::from("foggy")));
    }

    #[test]
    fn json_form_matches_column_form() {
        let json = serde_json::to_string(&WeatherCondition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"partly_cloudy\"");
    }
}
