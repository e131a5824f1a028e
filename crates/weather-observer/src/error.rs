//! Error types for the observer API.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use weather_core::StoreError;

/// Message returned when the log holds nothing to report.
pub const NO_DATA: &str = "No data available";

/// Errors that can occur in the observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The log holds no observation for this request.
    #[error("{0}")]
    NotFound(String),

    /// An invalid query parameter was provided.
    #[error("{0}")]
    InvalidQuery(String),

    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ObserverError {
    /// The standard "no data" error.
    pub fn no_data() -> Self {
        Self::NotFound(String::from(NO_DATA))
    }

    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(ObserverError::no_data().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ObserverError::InvalidQuery(String::from("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ObserverError::from(StoreError::Query(String::from("down"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_keep_their_message() {
        let err = ObserverError::from(StoreError::Query(String::from("relation missing")));
        assert_eq!(err.to_string(), "query failed: relation missing");
    }
}
