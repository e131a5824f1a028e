//! `PostgreSQL` data layer for the synthetic weather station.
//!
//! The `weather_data` table is the observation log shared by the two
//! processes. The generator appends to it; the observer reads it. Neither
//! process holds any other shared state.
//!
//! ```text
//! weather-generator --append--> weather_data <--latest/history/stats-- weather-observer
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration, and migrations
//! - [`observation_store`] -- Appends and queries over `weather_data`
//! - [`error`] -- Shared error types

pub mod error;
pub mod observation_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::DbError;
pub use observation_store::{ObservationRow, ObservationStore, PostgresConnector, StatsRow};
pub use postgres::{PostgresConfig, PostgresPool};
