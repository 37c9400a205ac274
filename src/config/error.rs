//! Configuration errors.
//!
//! Everything in here is fatal: the proxy never starts half-configured.

use std::path::PathBuf;

use crate::config::validation::ValidationError;

/// Exit code used when `--dest` or `--url` is missing.
pub const EXIT_MISSING_ARGUMENTS: u8 = 22;

/// Error raised while turning arguments and settings into a [`ProxyConfig`].
///
/// [`ProxyConfig`]: crate::config::ProxyConfig
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required flag (`--dest`, `--url`) was not supplied.
    #[error("{0}")]
    MissingArguments(clap::Error),

    /// Any other command line problem (unknown flag, missing value, `--help`).
    #[error("{0}")]
    Usage(clap::Error),

    #[error("invalid destination {0:?}: expected [http://]host:port with a port of at least four digits")]
    InvalidDestination(String),

    #[error("invalid listen address {0:?}: expected [http://]host:port with a port of at least four digits")]
    InvalidListenAddress(String),

    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::MissingArguments(_) => EXIT_MISSING_ARGUMENTS,
            ConfigError::Usage(e) => u8::try_from(e.exit_code()).unwrap_or(2),
            _ => 1,
        }
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
