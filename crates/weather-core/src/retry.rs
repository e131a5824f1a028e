//! Bounded connection retry and the generator lifecycle.
//!
//! The generator moves through three states:
//!
//! ```text
//!            connect ok
//! Connecting(n) -------> Running
//!   |    ^                 |
//!   |    | n < max         | append failed
//!   |    +--- fail --------+---> Connecting(1)
//!   |
//!   +-- fail, n == max --> Terminated
//! ```
//!
//! Attempts are separated by a fixed delay; there is no sleep after the
//! last attempt.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::clock::Sleeper;
use crate::store::{LogConnector, StoreError};

/// Default number of connection attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay between connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// A policy making at most `max_attempts` attempts, `delay` apart.
    ///
    /// A policy always makes at least one attempt.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Maximum number of attempts.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempts.
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Where the generator is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Making connection attempt `attempt` (1-based).
    Connecting {
        /// The attempt in progress.
        attempt: u32,
    },
    /// Connected and producing observations.
    Running,
    /// Retries exhausted; the run is over.
    Terminated,
}

impl Lifecycle {
    /// The state at process start.
    pub const fn start() -> Self {
        Self::Connecting { attempt: 1 }
    }

    /// Transition after a successful connection.
    pub const fn on_connected(self) -> Self {
        match self {
            Self::Terminated => Self::Terminated,
            Self::Connecting { .. } | Self::Running => Self::Running,
        }
    }

    /// Transition after a failed connection attempt.
    pub const fn on_connect_failed(self, policy: &RetryPolicy) -> Self {
        match self {
            Self::Connecting { attempt } if attempt < policy.max_attempts => Self::Connecting {
                attempt: attempt.saturating_add(1),
            },
            Self::Connecting { .. } | Self::Terminated => Self::Terminated,
            Self::Running => Self::Running,
        }
    }

    /// Transition after an append failed: start reconnecting.
    pub const fn on_write_failed(self) -> Self {
        match self {
            Self::Running => Self::start(),
            other => other,
        }
    }

    /// Whether the run is over.
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Every attempt allowed by the policy failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to connect after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    /// Number of attempts made.
    pub attempts: u32,
    /// The error from the final attempt.
    pub last_error: StoreError,
}

/// Connect through `connector`, retrying per `policy`.
///
/// `lifecycle` must be in `Connecting`; it ends in `Running` on success and
/// `Terminated` on exhaustion.
///
/// # Errors
///
/// Returns [`RetryExhausted`] once `policy.max_attempts()` attempts have
/// failed.
pub async fn connect_with_retry<C: LogConnector>(
    connector: &C,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    lifecycle: &mut Lifecycle,
) -> Result<C::Log, RetryExhausted> {
    loop {
        let Lifecycle::Connecting { attempt } = *lifecycle else {
            return Err(RetryExhausted {
                attempts: 0,
                last_error: StoreError::Connection(format!(
                    "connect requested in state {lifecycle:?}"
                )),
            });
        };

        match connector.connect().await {
            Ok(log) => {
                *lifecycle = lifecycle.on_connected();
                info!(attempt, "Connected to observation log");
                return Ok(log);
            }
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts(),
                    error = %e,
                    "Connection attempt failed"
                );
                *lifecycle = lifecycle.on_connect_failed(policy);
                if lifecycle.is_terminated() {
                    error!(
                        attempts = attempt,
                        "Failed to connect after maximum retries"
                    );
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                sleeper.sleep(policy.delay()).await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::clock::RecordingSleeper;
    use crate::memory::{MemoryConnector, MemoryLog};

    /// Connector that never succeeds.
    struct Unreachable {
        attempts: AtomicU32,
    }

    impl LogConnector for Unreachable {
        type Log = MemoryLog;

        fn connect(&self) -> BoxFuture<'_, Result<Self::Log, StoreError>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(StoreError::Connection(String::from("refused"))) })
        }
    }

    #[test]
    fn lifecycle_transitions() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let start = Lifecycle::start();

        let second = start.on_connect_failed(&policy);
        assert_eq!(second, Lifecycle::Connecting { attempt: 2 });
        assert_eq!(second.on_connect_failed(&policy), Lifecycle::Terminated);
        assert_eq!(start.on_connected(), Lifecycle::Running);
        assert_eq!(Lifecycle::Running.on_write_failed(), Lifecycle::start());
        assert_eq!(Lifecycle::Terminated.on_connected(), Lifecycle::Terminated);
    }

    #[test]
    fn policy_always_allows_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
        let defaults = RetryPolicy::default();
        assert_eq!(defaults.max_attempts(), 10);
        assert_eq!(defaults.delay(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn exhausts_exactly_max_attempts() {
        let connector = Unreachable {
            attempts: AtomicU32::new(0),
        };
        let policy = RetryPolicy::new(4, Duration::from_secs(5));
        let sleeper = RecordingSleeper::new();
        let mut lifecycle = Lifecycle::start();

        let err = connect_with_retry(&connector, &policy, &sleeper, &mut lifecycle)
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 4);
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 4);
        // Delays only between attempts.
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(5); 3]);
        assert_eq!(lifecycle, Lifecycle::Terminated);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let connector = MemoryConnector::new(MemoryLog::new()).refusing(2);
        let policy = RetryPolicy::new(5, Duration::from_millis(250));
        let sleeper = RecordingSleeper::new();
        let mut lifecycle = Lifecycle::start();

        let result = connect_with_retry(&connector, &policy, &sleeper, &mut lifecycle).await;

        assert!(result.is_ok());
        assert_eq!(connector.attempts(), 3);
        assert_eq!(sleeper.recorded().len(), 2);
        assert_eq!(lifecycle, Lifecycle::Running);
    }
}
