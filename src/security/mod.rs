//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (set X-Forwarded-For, strip hop-by-hop)
//!     → Forwarding engine
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → Client
//! ```
//!
//! # Design Decisions
//! - No trust in client-supplied forwarding headers

pub mod headers;
