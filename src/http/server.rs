//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router: interceptor in front of the forwarding engine
//! - Wire up request tracing
//! - Serve a bound listener, one task per connection, until shutdown

use std::net::SocketAddr;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::forward::{forward_handler, Forwarder};
use crate::http::intercept::intercept;
use crate::lifecycle::ShutdownSignal;
use crate::observability::Logger;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub logger: Logger,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    pub fn new(config: ProxyConfig, logger: Logger) -> Self {
        let state = AppState {
            forwarder: Forwarder::new(config.upstream.clone(), &config.timeouts),
            logger,
        };

        Self {
            router: Self::build_router(state),
            config,
        }
    }

    /// Every method and path goes through the interceptor to the forwarder.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(forward_handler)
            .layer(middleware::from_fn_with_state(state.clone(), intercept))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Serve `listener` until `shutdown` fires.
    ///
    /// In-flight exchanges are allowed to finish before this returns.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::debug!(address = %addr, upstream = %self.config.upstream, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::debug!("HTTP server stopped");
        Ok(())
    }
}
