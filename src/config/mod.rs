//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (--dest, --url, --log, --config)
//!     → cli.rs (clap parsing, typed ConfigError)
//!     → target.rs (validate destination and listen address)
//!     → loader.rs (optional TOML settings file)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (resolved, immutable)
//!     → shared read-only with every connection task
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; the upstream never changes at runtime
//! - All settings have defaults so the file is optional
//! - Every error here is fatal before the listener is bound

pub mod error;
pub mod loader;
pub mod schema;
pub mod target;
pub mod validation;

pub use error::ConfigError;
pub use schema::{FileConfig, LogTarget, ObservabilityConfig, ProxyConfig, TimeoutConfig};
pub use target::{resolve, ListenAddress, Upstream};
