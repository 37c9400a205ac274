//! Forwarding engine.
//!
//! # Responsibilities
//! - Turn an inbound request into exactly one outbound request on the upstream
//! - Issue it over a pooled connection with connect and response deadlines
//! - Stream the upstream response back with hop-by-hop headers stripped
//! - Relay protocol upgrades (`101 Switching Protocols`) as a raw tunnel
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - Framing (`Content-Length` / chunked) is recomputed by hyper for each leg
//! - The response-header deadline starts once the request body is sent; an
//!   upload is bounded by the idle timeout instead
//! - A response body dropped early (client gone) drops its upstream connection
//!   instead of returning it to the pool

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{HOST, UPGRADE};
use axum::http::uri::PathAndQuery;
use axum::http::{Extensions, StatusCode, Version};
use axum::response::Response;
use hyper::body::Incoming;
use hyper::upgrade::OnUpgrade;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};

use crate::config::{TimeoutConfig, Upstream};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::timeouts::{IdleTimeout, NotifyOnEnd};
use crate::security::headers;

pub type UpstreamClient = Client<HttpConnector, Body>;

/// Failure of a single upstream exchange. Always answered with 502.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("{0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream sent no response within {0:?}")]
    Timeout(Duration),

    #[error("upstream switched protocols without being asked to")]
    UnexpectedUpgrade,
}

impl UpstreamError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Request(_) => "request",
            UpstreamError::Transport(e) if e.is_connect() => "connect",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::UnexpectedUpgrade => "upgrade",
        }
    }
}

/// Build the pooled HTTP/1.1 client used for every upstream exchange.
pub fn build_client(timeouts: &TimeoutConfig) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(timeouts.connect()));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(timeouts.pool_idle())
        .build(connector)
}

/// Forwards requests to the one configured upstream.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    upstream: Arc<Upstream>,
    response_timeout: Duration,
    idle_timeout: Duration,
}

impl Forwarder {
    pub fn new(upstream: Upstream, timeouts: &TimeoutConfig) -> Self {
        Self {
            client: build_client(timeouts),
            upstream: Arc::new(upstream),
            response_timeout: timeouts.upstream(),
            idle_timeout: timeouts.idle(),
        }
    }

    /// Rewrite `request` so it targets the upstream.
    ///
    /// Method, path and query, end-to-end headers and the body are kept as
    /// they are. `Host` names the upstream. A requested protocol upgrade keeps
    /// its `Connection` and `Upgrade` headers.
    pub fn outbound_request(&self, request: Request) -> Result<Request, UpstreamError> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        parts.uri = self.upstream.uri_for(path_and_query)?;
        parts.version = Version::HTTP_11;
        parts.extensions = Extensions::new();

        let upgrade = headers::upgrade_protocol(&parts.headers);
        headers::strip_hop_by_hop(&mut parts.headers);
        if let Some(protocol) = upgrade {
            headers::restore_upgrade(&mut parts.headers, protocol);
        }
        parts
            .headers
            .insert(HOST, self.upstream.host_header().clone());

        Ok(Request::from_parts(parts, body))
    }

    /// Send `request` upstream and return the response to relay.
    pub async fn forward(&self, mut request: Request) -> Result<Response, UpstreamError> {
        let client_upgrade = headers::upgrade_protocol(request.headers())
            .is_some()
            .then(|| hyper::upgrade::on(&mut request));

        let (parts, body) = self.outbound_request(request)?.into_parts();
        let (body, uploaded) = NotifyOnEnd::new(IdleTimeout::new(body, self.idle_timeout));
        let exchange = self.client.request(Request::from_parts(parts, Body::new(body)));
        tokio::pin!(exchange);

        let answered_early = tokio::select! {
            result = &mut exchange => Some(result),
            _ = uploaded => None,
        };
        let mut upstream_response = match answered_early {
            Some(result) => result?,
            None => tokio::time::timeout(self.response_timeout, exchange)
                .await
                .map_err(|_| UpstreamError::Timeout(self.response_timeout))??,
        };

        if upstream_response.status() == StatusCode::SWITCHING_PROTOCOLS {
            let client_upgrade = client_upgrade.ok_or(UpstreamError::UnexpectedUpgrade)?;
            let upstream_upgrade = hyper::upgrade::on(&mut upstream_response);
            tokio::spawn(tunnel(client_upgrade, upstream_upgrade));
            return Ok(switching_protocols(upstream_response));
        }

        let (mut parts, body) = upstream_response.into_parts();
        headers::strip_hop_by_hop(&mut parts.headers);

        let body = Body::new(IdleTimeout::new(body, self.idle_timeout));
        Ok(Response::from_parts(parts, body))
    }
}

/// The `101` relayed to the client, with the upgrade headers kept.
fn switching_protocols(upstream_response: hyper::Response<Incoming>) -> Response {
    let (mut parts, _) = upstream_response.into_parts();
    let protocol = parts.headers.get(UPGRADE).cloned();

    headers::strip_hop_by_hop(&mut parts.headers);
    if let Some(protocol) = protocol {
        headers::restore_upgrade(&mut parts.headers, protocol);
    }
    Response::from_parts(parts, Body::empty())
}

/// Copy bytes both ways once both legs have switched protocols.
async fn tunnel(client: OnUpgrade, upstream: OnUpgrade) {
    match tokio::try_join!(client, upstream) {
        Ok((client, upstream)) => {
            let mut client = TokioIo::new(client);
            let mut upstream = TokioIo::new(upstream);
            match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
                Ok((sent, received)) => {
                    tracing::debug!(sent, received, "Upgraded connection closed");
                }
                Err(e) => tracing::debug!(error = %e, "Upgraded connection ended"),
            }
        }
        Err(e) => tracing::warn!(error = %e, "Protocol upgrade failed"),
    }
}

/// Fallback handler: every request that reaches the router ends up here.
pub async fn forward_handler(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    match state.forwarder.forward(request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start);
            response
        }
        Err(e) => {
            state.logger.upstream_failure(&method, &uri, &e);
            metrics::record_upstream_failure(e.kind());

            let response = response::bad_gateway();
            metrics::record_request(&method, response.status().as_u16(), start);
            response
        }
    }
}
