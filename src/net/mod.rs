//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenAddress
//!     → listener.rs (bind, fatal on failure)
//!     → HttpServer::run (accept loop, one task per connection)
//! ```

pub mod listener;
