//! TCP listener setup.
//!
//! # Responsibilities
//! - Bind the configured listen address
//! - Report bind failures as a distinct, fatal error

use tokio::net::TcpListener;

use crate::config::ListenAddress;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind to `address`, resolving host names if needed.
pub async fn bind(address: &ListenAddress) -> Result<TcpListener, ListenerError> {
    let listener = TcpListener::bind((address.host(), address.port()))
        .await
        .map_err(|source| ListenerError::Bind {
            address: address.to_string(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::debug!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}
