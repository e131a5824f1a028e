//! Appends and queries over the `weather_data` table.
//!
//! Every append runs in its own transaction, so a failed insert leaves no
//! trace. Reads are single statements; the window arithmetic is done by
//! `PostgreSQL` against its own `NOW()` so the cutoff matches the clock that
//! stamped the rows.

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::BoxFuture;
use sqlx::PgPool;
use tracing::warn;
use weather_core::{LogConnector, ObservationLog, ObservationQuery, StoreError};
use weather_types::{
    Observation, ObservationId, PeakStats, RangeStats, Reading, WeatherCondition, WindowStats,
};

use crate::error::DbError;
use crate::postgres::{PostgresConfig, PostgresPool};

const INSERT_OBSERVATION: &str = r"
    INSERT INTO weather_data
        (temperature, humidity, pressure, wind_speed, wind_direction, weather_condition)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, timestamp, temperature, humidity, pressure,
              wind_speed, wind_direction, weather_condition";

const SELECT_LATEST: &str = r"
    SELECT id, timestamp, temperature, humidity, pressure,
           wind_speed, wind_direction, weather_condition
    FROM weather_data
    ORDER BY timestamp DESC, id DESC
    LIMIT 1";

const SELECT_HISTORY: &str = r"
    SELECT id, timestamp, temperature, humidity, pressure,
           wind_speed, wind_direction, weather_condition
    FROM weather_data
    WHERE timestamp > NOW() - ($1::BIGINT * INTERVAL '1 second')
    ORDER BY timestamp ASC, id ASC";

const SELECT_STATS: &str = r"
    SELECT
        COUNT(*)                         AS sample_count,
        COALESCE(AVG(temperature), 0)    AS avg_temperature,
        COALESCE(MIN(temperature), 0)    AS min_temperature,
        COALESCE(MAX(temperature), 0)    AS max_temperature,
        COALESCE(AVG(humidity), 0)       AS avg_humidity,
        COALESCE(MIN(humidity), 0)       AS min_humidity,
        COALESCE(MAX(humidity), 0)       AS max_humidity,
        COALESCE(AVG(pressure), 0)       AS avg_pressure,
        COALESCE(MIN(pressure), 0)       AS min_pressure,
        COALESCE(MAX(pressure), 0)       AS max_pressure,
        COALESCE(AVG(wind_speed), 0)     AS avg_wind_speed,
        COALESCE(MAX(wind_speed), 0)     AS max_wind_speed
    FROM weather_data
    WHERE timestamp > NOW() - ($1::BIGINT * INTERVAL '1 second')";

/// Operations on the `weather_data` table.
#[derive(Debug, Clone)]
pub struct ObservationStore {
    pool: PgPool,
}

impl ObservationStore {
    /// Create a store over a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a store sharing the pool of a [`PostgresPool`].
    pub fn from_pool(pool: &PostgresPool) -> Self {
        Self::new(pool.pool().clone())
    }

    /// Insert one reading in its own transaction.
    ///
    /// The database assigns `id` and `timestamp`. On failure the
    /// transaction is rolled back before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert or commit fails.
    pub async fn insert(&self, reading: &Reading) -> Result<Observation, DbError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, ObservationRow>(INSERT_OBSERVATION)
            .bind(reading.temperature)
            .bind(reading.humidity)
            .bind(reading.pressure)
            .bind(reading.wind_speed)
            .bind(reading.wind_direction)
            .bind(reading.weather_condition.as_db_str())
            .fetch_one(&mut *tx)
            .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback after failed insert also failed");
                }
                return Err(e.into());
            }
        };

        tx.commit().await?;
        row.try_into()
    }

    /// The most recent observation, or `None` for an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn latest(&self) -> Result<Option<Observation>, DbError> {
        let row = sqlx::query_as::<_, ObservationRow>(SELECT_LATEST)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Observation::try_from).transpose()
    }

    /// Observations newer than `now - window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn history(&self, window: TimeDelta) -> Result<Vec<Observation>, DbError> {
        let rows = sqlx::query_as::<_, ObservationRow>(SELECT_HISTORY)
            .bind(window.num_seconds())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Observation::try_from).collect()
    }

    /// Aggregates over observations newer than `now - window`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn stats(&self, window: TimeDelta) -> Result<WindowStats, DbError> {
        let row = sqlx::query_as::<_, StatsRow>(SELECT_STATS)
            .bind(window.num_seconds())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

impl ObservationLog for ObservationStore {
    fn append(&self, reading: Reading) -> BoxFuture<'_, Result<Observation, StoreError>> {
        Box::pin(async move { self.insert(&reading).await.map_err(DbError::into_write) })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(Self::close(self))
    }
}

impl ObservationQuery for ObservationStore {
    fn latest(&self) -> BoxFuture<'_, Result<Option<Observation>, StoreError>> {
        Box::pin(async move { Self::latest(self).await.map_err(DbError::into_query) })
    }

    fn history(&self, window: TimeDelta) -> BoxFuture<'_, Result<Vec<Observation>, StoreError>> {
        Box::pin(async move { Self::history(self, window).await.map_err(DbError::into_query) })
    }

    fn stats(&self, window: TimeDelta) -> BoxFuture<'_, Result<WindowStats, StoreError>> {
        Box::pin(async move { Self::stats(self, window).await.map_err(DbError::into_query) })
    }
}

/// Opens [`ObservationStore`]s for the generator.
///
/// Each `connect` builds a fresh pool and verifies it with a live
/// connection, so a failed attempt really means the database was
/// unreachable.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    config: PostgresConfig,
    run_migrations: bool,
}

impl PostgresConnector {
    /// A connector that does not touch the schema.
    pub const fn new(config: PostgresConfig) -> Self {
        Self {
            config,
            run_migrations: false,
        }
    }

    /// Apply pending migrations after every successful connect.
    #[must_use]
    pub const fn with_migrations(mut self) -> Self {
        self.run_migrations = true;
        self
    }

    async fn open(&self) -> Result<ObservationStore, DbError> {
        let pool = PostgresPool::connect(&self.config).await?;
        let migrated = if self.run_migrations {
            pool.run_migrations().await
        } else {
            Ok(())
        };
        if let Err(e) = migrated {
            pool.close().await;
            return Err(e);
        }
        Ok(ObservationStore::from_pool(&pool))
    }
}

impl LogConnector for PostgresConnector {
    type Log = ObservationStore;

    fn connect(&self) -> BoxFuture<'_, Result<Self::Log, StoreError>> {
        Box::pin(async move { self.open().await.map_err(DbError::into_connection) })
    }
}

/// A row from the `weather_data` table.
///
/// Uses runtime types rather than compile-time checked types to
/// avoid requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ObservationRow {
    /// Auto-incremented observation ID.
    pub id: i64,
    /// Append time assigned by the database.
    pub timestamp: DateTime<Utc>,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Pressure in hectopascals.
    pub pressure: f64,
    /// Wind speed in metres per second.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: i32,
    /// Condition as stored (`sunny`, `partly_cloudy`, ...).
    pub weather_condition: String,
}

impl TryFrom<ObservationRow> for Observation {
    type Error = DbError;

    fn try_from(row: ObservationRow) -> Result<Self, Self::Error> {
        let weather_condition: WeatherCondition = row
            .weather_condition
            .parse()
            .map_err(|e| DbError::Decode(format!("row {}: {e}", row.id)))?;

        Ok(Self {
            id: ObservationId(row.id),
            timestamp: row.timestamp,
            temperature: row.temperature,
            humidity: row.humidity,
            pressure: row.pressure,
            wind_speed: row.wind_speed,
            wind_direction: row.wind_direction,
            weather_condition,
        })
    }
}

/// The single row produced by the stats aggregate.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct StatsRow {
    /// Rows in the window.
    pub sample_count: i64,
    /// Mean temperature.
    pub avg_temperature: f64,
    /// Minimum temperature.
    pub min_temperature: f64,
    /// Maximum temperature.
    pub max_temperature: f64,
    /// Mean humidity.
    pub avg_humidity: f64,
    /// Minimum humidity.
    pub min_humidity: f64,
    /// Maximum humidity.
    pub max_humidity: f64,
    /// Mean pressure.
    pub avg_pressure: f64,
    /// Minimum pressure.
    pub min_pressure: f64,
    /// Maximum pressure.
    pub max_pressure: f64,
    /// Mean wind speed.
    pub avg_wind_speed: f64,
    /// Maximum wind speed.
    pub max_wind_speed: f64,
}

impl From<StatsRow> for WindowStats {
    fn from(row: StatsRow) -> Self {
        // An empty window reports zeros even if the driver hands back
        // something else for the coalesced columns.
        if row.sample_count <= 0 {
            return Self::empty();
        }
        Self {
            temperature: RangeStats {
                avg: row.avg_temperature,
                min: row.min_temperature,
                max: row.max_temperature,
            },
            humidity: RangeStats {
                avg: row.avg_humidity,
                min: row.min_humidity,
                max: row.max_humidity,
            },
            pressure: RangeStats {
                avg: row.avg_pressure,
                min: row.min_pressure,
                max: row.max_pressure,
            },
            wind_speed: PeakStats {
                avg: row.avg_wind_speed,
                max: row.max_wind_speed,
            },
            sample_count: u64::try_from(row.sample_count).unwrap_or(0),
        }
    }
}
