//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (one task each)
//!     → server.rs (Axum setup, tracing layer)
//!     → intercept.rs (access log line, X-Forwarded-For)
//!     → forward.rs (rewrite to upstream, issue, stream back or tunnel a 101)
//!     → response.rs (502 when the upstream exchange fails)
//!     → Send to client
//! ```

pub mod forward;
pub mod intercept;
pub mod response;
pub mod server;

pub use forward::{Forwarder, UpstreamError};
pub use server::{AppState, HttpServer};
