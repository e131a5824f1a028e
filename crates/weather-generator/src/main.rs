//! Generator binary for the synthetic weather station.
//!
//! Produces one synthetic observation per tick and appends it to the
//! `weather_data` table until `Ctrl-C` or `SIGTERM`, the configured tick limit, or
//! the database becoming unreachable.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `weather-config.yaml` and the environment
//! 3. Seed the random source (fixed seed if configured, else entropy)
//! 4. Build the `PostgreSQL` connector (migrations run on every connect)
//! 5. Run the generator loop until shutdown
//! 6. Exit non-zero if the database was lost

mod error;

use tracing::info;
use tracing_subscriber::EnvFilter;
use weather_core::config::StationConfig;
use weather_core::random::RngSource;
use weather_core::Generator;
use weather_db::{PostgresConfig, PostgresConnector};

use crate::error::GeneratorError;

/// Application entry point for the generator.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the database could not
/// be reached within the retry budget.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("weather-generator starting");

    // 2. Load configuration.
    let config = StationConfig::load().map_err(GeneratorError::from)?;
    let settings = config.generator.settings();
    info!(
        interval_secs = config.generator.interval_secs,
        max_attempts = settings.retry.max_attempts(),
        retry_delay_secs = config.generator.retry.delay_secs,
        max_ticks = ?settings.max_ticks,
        "Configuration loaded"
    );

    // 3. Seed the random source.
    let random = match config.generator.seed {
        Some(seed) => {
            info!(seed, "Using fixed seed");
            RngSource::seeded(seed)
        }
        None => RngSource::from_entropy(),
    };

    // 4. Build the connector.
    let pg_config = PostgresConfig::new(&config.infrastructure.database_url)
        .with_max_connections(config.infrastructure.max_connections);
    let connector = PostgresConnector::new(pg_config).with_migrations();

    // 5. Run until shutdown.
    let mut generator = Generator::new(connector, random, settings);
    let summary = generator.run(weather_core::signal::shutdown()).await;

    // 6. Map a lost database to a failing exit.
    if let Some(err) = GeneratorError::from_summary(&summary, settings.retry.max_attempts()) {
        return Err(err.into());
    }

    info!("weather-generator shutdown complete");
    Ok(())
}
