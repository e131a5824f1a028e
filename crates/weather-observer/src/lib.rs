//! Read API for the synthetic weather station.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for the latest observation, a trailing history
//!   window, and 24-hour rolling statistics
//! - **Minimal HTML status page** (`GET /`) showing the latest reading and
//!   links to the API endpoints
//!
//! # Architecture
//!
//! Handlers are stateless per request. Every read goes through the
//! [`ObservationQuery`] held in [`AppState`], which is the `PostgreSQL`
//! store in production and the in-memory log in tests. The observer never
//! writes to the log.
//!
//! [`ObservationQuery`]: weather_core::ObservationQuery

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
