//! OS signal handling.
//!
//! Ctrl+C (SIGINT) triggers a graceful shutdown.

use crate::lifecycle::Shutdown;
use crate::observability::Logger;

/// Wait for Ctrl+C, then trigger `shutdown`.
pub async fn shutdown_on_ctrl_c(shutdown: Shutdown, logger: Logger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            logger.shutdown();
            shutdown.trigger();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    }
}
