//! Weather model, continuity state, and generator orchestration for the
//! synthetic weather station.
//!
//! The generator produces one [`Reading`] per tick and appends it to an
//! observation log. The observer service reads that log back through the
//! [`ObservationQuery`] trait. The two never share memory; the log is the
//! only channel between them.
//!
//! # Modules
//!
//! - [`model`] -- The per-tick weather model and [`GeneratorState`]
//!   (the pressure random walk).
//! - [`random`] -- [`RandomSource`] seam with a `rand`-backed
//!   implementation and a scripted one for tests.
//! - [`clock`] -- Wall-clock and sleep seams.
//! - [`retry`] -- Bounded connection retry and the generator lifecycle
//!   state machine.
//! - [`generator`] -- The sequential tick loop.
//! - [`store`] -- Storage traits and the storage error taxonomy.
//! - [`memory`] -- In-memory observation log.
//! - [`aggregate`] -- Windowed statistics over observations.
//! - [`signal`] -- `Ctrl-C` / `SIGTERM` shutdown future for the binaries.
//! - [`config`] -- Configuration loading from `weather-config.yaml` and
//!   the environment.
//!
//! [`Reading`]: weather_types::Reading
//! [`ObservationQuery`]: store::ObservationQuery
//! [`GeneratorState`]: model::GeneratorState
//! [`RandomSource`]: random::RandomSource

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod generator;
pub mod memory;
pub mod model;
pub mod random;
pub mod retry;
pub mod signal;
pub mod store;

pub use generator::{EndReason, Generator, GeneratorSettings, RunSummary};
pub use store::{LogConnector, ObservationLog, ObservationQuery, StoreError};
