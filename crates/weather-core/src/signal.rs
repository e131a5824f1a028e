//! Process shutdown signals shared by both binaries.
//!
//! Container runtimes stop processes with `SIGTERM`, so it is treated the
//! same as `Ctrl-C`: the caller's loop sees the future resolve and gets to
//! release its storage connection before exit.

use tracing::{info, warn};

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// `SIGINT` / `Ctrl-C`.
    Interrupt,
    /// `SIGTERM` (Unix only).
    Terminate,
}

/// Resolve on `Ctrl-C` or, on Unix, `SIGTERM`.
///
/// Handlers are installed on first poll. A signal that cannot be listened
/// for is logged and then ignored, so the future never resolves spuriously.
pub async fn wait_for_shutdown() -> ShutdownSignal {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        () = ctrl_c => ShutdownSignal::Interrupt,
        () = terminate => ShutdownSignal::Terminate,
    };
    info!(signal = ?received, "Shutdown signal received");
    received
}

/// [`wait_for_shutdown`] with the signal discarded, for APIs that take a
/// `Future<Output = ()>`.
pub async fn shutdown() {
    wait_for_shutdown().await;
}
