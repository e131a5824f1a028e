//! Error types for the generator binary.
//!
//! [`GeneratorError`] is the top-level error type that wraps every failure
//! mode during startup and the outcome of a run that ended badly.

use weather_core::{EndReason, RunSummary};

/// Top-level error for the generator binary.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: weather_core::config::ConfigError,
    },

    /// The database never became reachable at startup.
    #[error("could not connect to the database after {attempts} attempts")]
    ConnectionExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Reconnecting after a failed write never succeeded.
    #[error("lost the database after {written} observations and could not reconnect")]
    ReconnectExhausted {
        /// Observations written before the connection was lost.
        written: u64,
    },
}

impl GeneratorError {
    /// Turn a run outcome into an error if it ended on a lost database.
    pub const fn from_summary(summary: &RunSummary, max_attempts: u32) -> Option<Self> {
        match summary.end_reason {
            EndReason::ConnectionExhausted => Some(Self::ConnectionExhausted {
                attempts: max_attempts,
            }),
            EndReason::ReconnectExhausted => Some(Self::ReconnectExhausted {
                written: summary.observations_written,
            }),
            EndReason::Shutdown | EndReason::TickLimit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(end_reason: EndReason) -> RunSummary {
        RunSummary {
            ticks: 4,
            observations_written: 3,
            write_failures: 1,
            reconnects: 0,
            end_reason,
        }
    }

    #[test]
    fn clean_endings_are_not_errors() {
        assert!(GeneratorError::from_summary(&summary(EndReason::Shutdown), 10).is_none());
        assert!(GeneratorError::from_summary(&summary(EndReason::TickLimit), 10).is_none());
    }

    #[test]
    fn lost_database_is_an_error() {
        let err = GeneratorError::from_summary(&summary(EndReason::ConnectionExhausted), 10);
        assert!(matches!(
            err,
            Some(GeneratorError::ConnectionExhausted { attempts: 10 })
        ));

        let err = GeneratorError::from_summary(&summary(EndReason::ReconnectExhausted), 10);
        assert!(matches!(
            err,
            Some(GeneratorError::ReconnectExhausted { written: 3 })
        ));
    }
}
