//! Request interceptor.
//!
//! Runs in front of the forwarding engine for every request: records who asked
//! for what, then pins `X-Forwarded-For` to the accepted connection before any
//! header is copied upstream.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::server::AppState;
use crate::security::headers;

pub async fn intercept(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    state.logger.request(remote, request.uri());
    headers::set_forwarded_for(request.headers_mut(), remote);
    next.run(request).await
}
