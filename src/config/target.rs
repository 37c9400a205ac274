//! Upstream target resolution.
//!
//! Both `--dest` and `--url` take the form `[http://]host:port`, where `host`
//! is made of ASCII letters, digits and dots and `port` has at least four
//! digits. Anything else is rejected outright instead of being silently
//! dropped. The host is used exactly as written, with no IPv4 shorthand expansion.

use std::fmt;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};

use crate::config::error::ConfigError;

const HTTP_PREFIX: &str = "http://";

/// Ports shorter than this are refused as a sanity floor.
const MIN_PORT_DIGITS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HostPort {
    host: String,
    port: u16,
}

fn parse_host_port(raw: &str) -> Option<HostPort> {
    let rest = raw.strip_prefix(HTTP_PREFIX).unwrap_or(raw);
    let (host, port) = rest.split_once(':')?;

    if host.is_empty() || !host.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.') {
        return None;
    }
    if port.len() < MIN_PORT_DIGITS || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(HostPort {
        host: host.to_string(),
        port: port.parse().ok()?,
    })
}

/// The validated upstream every request is forwarded to.
///
/// Built once at startup by [`resolve`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Upstream {
    authority: Authority,
    host_header: HeaderValue,
}

/// Validate `address` and turn it into an [`Upstream`].
///
/// A missing scheme defaults to plain `http`.
pub fn resolve(address: &str) -> Result<Upstream, ConfigError> {
    let invalid = || ConfigError::InvalidDestination(address.to_string());

    let HostPort { host, port } = parse_host_port(address).ok_or_else(invalid)?;
    let authority: Authority = format!("{host}:{port}").parse().map_err(|_| invalid())?;
    let host_header = HeaderValue::from_str(authority.as_str()).map_err(|_| invalid())?;

    Ok(Upstream {
        authority,
        host_header,
    })
}

impl Upstream {
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Value sent as `Host` on every outbound request.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Absolute URI for `path_and_query` on this upstream.
    pub fn uri_for(&self, path_and_query: PathAndQuery) -> Result<Uri, axum::http::Error> {
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{HTTP_PREFIX}{}", self.authority)
    }
}

/// Local address the proxy listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddress {
    host: String,
    port: u16,
}

impl ListenAddress {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let HostPort { host, port } = parse_host_port(raw)
            .ok_or_else(|| ConfigError::InvalidListenAddress(raw.to_string()))?;
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
