//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers on both legs
//! - Set X-Forwarded-For from the accepted connection
//! - Carry `Connection: upgrade` / `Upgrade` across when a protocol switch
//!   is being negotiated
//!
//! # Design Decisions
//! - A client-supplied X-Forwarded-For is replaced, never appended to
//! - Headers named by `Connection` are hop-by-hop too, except the ones the
//!   proxy itself sets for the upstream

use std::net::SocketAddr;

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, CONNECTION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE,
    TRAILER, TRANSFER_ENCODING, UPGRADE,
};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

/// Headers that only describe a single connection leg.
const HOP_BY_HOP: [HeaderName; 9] = [
    CONNECTION,
    KEEP_ALIVE,
    PROXY_CONNECTION,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .filter(|name| *name != X_FORWARDED_FOR)
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// The protocol requested in `Upgrade`, when `Connection` carries the
/// `upgrade` token.
pub fn upgrade_protocol(headers: &HeaderMap) -> Option<HeaderValue> {
    let requested = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    if requested {
        headers.get(UPGRADE).cloned()
    } else {
        None
    }
}

/// Put back the headers of a protocol switch after [`strip_hop_by_hop`].
pub fn restore_upgrade(headers: &mut HeaderMap, protocol: HeaderValue) {
    headers.insert(CONNECTION, HeaderValue::from_static("upgrade"));
    headers.insert(UPGRADE, protocol);
}

/// Overwrite X-Forwarded-For with the connection's remote address.
pub fn set_forwarded_for(headers: &mut HeaderMap, remote: SocketAddr) {
    // A SocketAddr only renders visible ASCII.
    if let Ok(value) = HeaderValue::from_str(&remote.to_string()) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
