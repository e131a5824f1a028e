//! Shared application state for the observer API.

use std::sync::Arc;

use weather_core::ObservationQuery;

/// State shared by every request handler.
///
/// Holds only the read handle on the observation log. Nothing here is
/// mutated by requests.
#[derive(Clone)]
pub struct AppState {
    /// Read-only view over the observation log.
    pub query: Arc<dyn ObservationQuery>,
}

impl AppState {
    /// Wrap a query backend.
    pub fn new(query: impl ObservationQuery + 'static) -> Self {
        Self {
            query: Arc::new(query),
        }
    }

    /// Share an existing query backend.
    pub fn from_shared(query: Arc<dyn ObservationQuery>) -> Self {
        Self { query }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
