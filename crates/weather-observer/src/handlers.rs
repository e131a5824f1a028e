//! REST API endpoint handlers for the observer server.
//!
//! All handlers read through the [`ObservationQuery`] in the shared
//! [`AppState`]. None of them write.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/latest` | Most recent observation |
//! | `GET` | `/api/history` | Observations in a trailing window (`?hours=N`) |
//! | `GET` | `/api/stats` | Aggregates over the trailing 24 hours |
//!
//! [`ObservationQuery`]: weather_core::ObservationQuery

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::TimeDelta;
use weather_core::clock::{MAX_WINDOW_HOURS, window_from_hours};
use weather_core::store::{STATS_WINDOW_HOURS, stats_window};
use weather_types::Observation;

use crate::error::{NO_DATA, ObserverError};
use crate::state::AppState;

/// Window used by `/api/history` when `hours` is omitted.
pub const DEFAULT_HISTORY_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/history` endpoint.
///
/// `hours` is taken as a raw string so that a malformed value becomes a
/// JSON 400 from [`ObserverError`] rather than Axum's plain-text rejection.
#[derive(Debug, Default, serde::Deserialize)]
pub struct HistoryQuery {
    /// Window length in whole hours (default 24).
    pub hours: Option<String>,
}

impl HistoryQuery {
    /// Resolve the requested window.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::InvalidQuery`] for a value that is not a
    /// non-negative integer, or one above [`MAX_WINDOW_HOURS`].
    pub fn window(&self) -> Result<TimeDelta, ObserverError> {
        let hours = match self.hours.as_deref() {
            None => DEFAULT_HISTORY_HOURS,
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                ObserverError::InvalidQuery(format!(
                    "hours must be a non-negative integer, got {raw:?} ({e})"
                ))
            })?,
        };

        window_from_hours(hours).ok_or_else(|| {
            ObserverError::InvalidQuery(format!(
                "hours out of range: {hours} (expected 0..={MAX_WINDOW_HOURS})"
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the latest reading and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = match state.query.latest().await {
        Ok(Some(obs)) => render_latest(&obs),
        Ok(None) => String::from(r#"<p class="muted">No observations recorded yet.</p>"#),
        Err(e) => {
            tracing::warn!(error = %e, "Status page could not read the latest observation");
            String::from(r#"<p class="error">Observation log unavailable.</p>"#)
        }
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Weather Station</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        .muted {{ color: #8b949e; }}
        .error {{ color: #f85149; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Weather Station</h1>
    <p class="subtitle">Synthetic observations, served from the observation log</p>

    {summary}

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/latest">/api/latest</a> -- Most recent observation</li>
        <li><a href="/api/history">/api/history</a> -- Trailing window (?hours=N, default {DEFAULT_HISTORY_HOURS})</li>
        <li><a href="/api/stats">/api/stats</a> -- Aggregates over the last {STATS_WINDOW_HOURS} hours</li>
    </ul>
</body>
</html>"#
    ))
}

fn render_latest(obs: &Observation) -> String {
    let metrics = [
        ("Temperature", format!("{:.1} &deg;C", obs.temperature)),
        ("Humidity", format!("{:.1} %", obs.humidity)),
        ("Pressure", format!("{:.1} hPa", obs.pressure)),
        ("Wind", format!("{:.1} m/s @ {}&deg;", obs.wind_speed, obs.wind_direction)),
        ("Condition", obs.weather_condition.to_string()),
    ];

    let cards: String = metrics
        .iter()
        .map(|(label, value)| {
            format!(
                r#"
        <div class="metric">
            <div class="label">{label}</div>
            <div class="value">{value}</div>
        </div>"#
            )
        })
        .collect();

    format!(
        r#"<p class="muted">Observation #{} at {}</p>
    <div>{cards}
    </div>"#,
        obs.id,
        obs.timestamp.to_rfc3339()
    )
}

// ---------------------------------------------------------------------------
// GET /api/latest -- most recent observation
// ---------------------------------------------------------------------------

/// Return the most recently appended observation.
///
/// Responds 404 when the log is empty.
pub async fn latest(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Observation>, ObserverError> {
    state
        .query
        .latest()
        .await?
        .map(Json)
        .ok_or_else(ObserverError::no_data)
}

// ---------------------------------------------------------------------------
// GET /api/history -- trailing window
// ---------------------------------------------------------------------------

/// Return every observation newer than `now - hours`, oldest first.
///
/// # Query Parameters
///
/// - `hours`: non-negative integer (default: 24)
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<Observation>>, ObserverError> {
    let window = params.window()?;
    let observations = state.query.history(window).await?;
    Ok(Json(observations))
}

// ---------------------------------------------------------------------------
// GET /api/stats -- 24 hour aggregates
// ---------------------------------------------------------------------------

/// Return aggregates over the trailing 24 hours.
///
/// An empty window is reported as 404 carrying both the error message and
/// the zero-valued aggregates, so dashboards can render either.
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Response, ObserverError> {
    let stats = state.query.stats(stats_window()).await?;
    let mut body = serde_json::to_value(stats)?;

    if !stats.is_empty() {
        return Ok(Json(body).into_response());
    }

    if let Some(fields) = body.as_object_mut() {
        fields.insert(String::from("error"), serde_json::json!(NO_DATA));
        fields.insert(
            String::from("status"),
            serde_json::json!(StatusCode::NOT_FOUND.as_u16()),
        );
    }
    Ok((StatusCode::NOT_FOUND, Json(body)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(hours: Option<&str>) -> HistoryQuery {
        HistoryQuery {
            hours: hours.map(str::to_owned),
        }
    }

    #[test]
    fn history_window_defaults_to_a_day() {
        assert_eq!(query(None).window().unwrap(), TimeDelta::hours(24));
    }

    #[test]
    fn history_window_accepts_zero_and_whole_hours() {
        assert_eq!(query(Some("0")).window().unwrap(), TimeDelta::zero());
        assert_eq!(query(Some("6")).window().unwrap(), TimeDelta::hours(6));
    }

    #[test]
    fn history_window_rejects_bad_values() {
        for raw in ["-1", "1.5", "abc", "", "99999999999999999999"] {
            let err = query(Some(raw)).window().unwrap_err();
            assert!(matches!(err, ObserverError::InvalidQuery(_)), "{raw}");
        }
    }

    #[test]
    fn history_window_accepts_the_largest_storable_window() {
        assert_eq!(
            query(Some("1000000")).window().unwrap(),
            TimeDelta::hours(MAX_WINDOW_HOURS)
        );
        let err = query(Some("100000000")).window().unwrap_err();
        assert!(matches!(err, ObserverError::InvalidQuery(_)));
    }

    #[test]
    fn history_window_rejects_overflowing_hours() {
        let err = query(Some(&i64::MAX.to_string())).window().unwrap_err();
        assert!(matches!(err, ObserverError::InvalidQuery(_)));
    }
}
