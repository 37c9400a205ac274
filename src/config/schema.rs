//! Configuration schema definitions.
//!
//! [`FileConfig`] is what the optional TOML settings file deserializes into;
//! every field has a default so an empty file (or no file) is valid.
//! [`ProxyConfig`] is the fully resolved, immutable configuration the server
//! runs with.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::target::{ListenAddress, Upstream};

/// Root of the settings file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Timeout configuration for the upstream leg.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP connect timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to send response headers, in seconds.
    pub upstream_secs: u64,

    /// Longest gap between two body frames from the upstream, in seconds.
    pub idle_secs: u64,

    /// How long an unused pooled connection is kept, in seconds.
    pub pool_idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            idle_secs: 60,
            pool_idle_secs: 90,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn pool_idle(&self) -> Duration {
        Duration::from_secs(self.pool_idle_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Bind address of the Prometheus endpoint. Metrics are off when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stdout,
    /// Opened (or created) in append mode.
    File(PathBuf),
}

impl LogTarget {
    /// Interpret the `--log` argument: absent or `stdout` means standard output.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("") | Some("stdout") => LogTarget::Stdout,
            Some(path) => LogTarget::File(PathBuf::from(path)),
        }
    }
}

/// Resolved configuration of a running proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub listen: ListenAddress,
    pub upstream: Upstream,
    pub log: LogTarget,
    pub timeouts: TimeoutConfig,
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Configuration with a stdout log; `--log` is applied by the caller.
    pub fn with_settings(listen: ListenAddress, upstream: Upstream, settings: FileConfig) -> Self {
        Self {
            listen,
            upstream,
            log: LogTarget::Stdout,
            timeouts: settings.timeouts,
            observability: settings.observability,
        }
    }
}
