//! Responses synthesized by the proxy itself.
//!
//! Upstream responses are relayed as they are (see `forward.rs`); the only
//! response the proxy makes up is the one sent when the upstream exchange fails.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// `502 Bad Gateway` with a short plain-text body.
pub fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "502 Bad Gateway\n",
    )
        .into_response()
}
