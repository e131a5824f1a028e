//! Observer binary for the synthetic weather station.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `weather-config.yaml` and the environment
//! 3. Create a lazy `PostgreSQL` pool (the server starts even if the
//!    database is still coming up)
//! 4. Serve the read API until `Ctrl-C` or `SIGTERM`

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use weather_core::config::StationConfig;
use weather_db::{ObservationStore, PostgresConfig, PostgresPool};
use weather_observer::{AppState, ServerConfig, start_server};

/// Application entry point for the observer.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("weather-observer starting");

    // 2. Load configuration.
    let config = StationConfig::load()?;
    let server_config = ServerConfig::from(&config.observer);
    info!(
        host = server_config.host,
        port = server_config.port,
        max_connections = config.infrastructure.max_connections,
        "Configuration loaded"
    );

    // 3. Create the connection pool.
    let pg_config = PostgresConfig::new(&config.infrastructure.database_url)
        .with_max_connections(config.infrastructure.max_connections);
    let pool = PostgresPool::connect_lazy(&pg_config)?;
    let store = ObservationStore::from_pool(&pool);
    let state = Arc::new(AppState::new(store));

    // 4. Serve until Ctrl-C or SIGTERM.
    start_server(&server_config, state, weather_core::signal::shutdown()).await?;

    pool.close().await;
    info!("weather-observer shutdown complete");
    Ok(())
}
