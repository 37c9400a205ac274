//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! startup, interceptor, forwarding engine:
//!     → logging.rs (Logger capability → stdout or log file)
//!     → metrics.rs (counters, histograms → optional Prometheus endpoint)
//! ```
//!
//! # Design Decisions
//! - The logger is passed explicitly; nothing swaps a global writer at runtime
//! - One line per request, written atomically
//! - Metrics are cheap and disabled unless an address is configured

pub mod logging;
pub mod metrics;

pub use logging::{LogSink, Logger};
