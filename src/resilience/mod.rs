//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → connect timeout (HTTP connector)
//!     → response-header timeout (forwarding engine)
//!     → timeouts.rs (idle timeout while streaming the body)
//!     → On failure: 502 to the client, never a hung connection
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - Single attempt: failures are reported, never retried

pub mod timeouts;
