//! Identifier wrapper for observations.
//!
//! Identifiers are assigned by the observation log on append (a
//! `BIGSERIAL` column in `PostgreSQL`, a counter in the in-memory log) and
//! increase monotonically. The generator never creates one.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Log-assigned, monotonically increasing observation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ObservationId(pub i64);

impl ObservationId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// The identifier the log assigns after this one.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for ObservationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ObservationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ObservationId> for i64 {
    fn from(id: ObservationId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&ObservationId(42)).unwrap_or_default();
        assert_eq!(json, "42");
    }

    #[test]
    fn next_is_strictly_greater() {
        let id = ObservationId(7);
        assert!(id.next() > id);
        assert_eq!(ObservationId(i64::MAX).next(), ObservationId(i64::MAX));
    }
}
