//! Shared type definitions for the synthetic weather station.
//!
//! This crate is the single source of truth for the types exchanged between
//! the generator, the data layer, and the observer API. Payload types are
//! exported to `TypeScript` via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrapper for log-assigned observation identifiers
//! - [`enums`] -- The derived weather condition
//! - [`structs`] -- Readings, observations, and windowed statistics

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ParseConditionError, WeatherCondition};
pub use ids::ObservationId;
pub use structs::{Observation, PeakStats, RangeStats, Reading, WindowStats};
