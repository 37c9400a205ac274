//! Command line surface.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::config::{
    self, ConfigError, FileConfig, ListenAddress, LogTarget, ProxyConfig,
};

#[derive(Debug, Parser)]
#[command(name = "hostrelay")]
#[command(about = "Forward every HTTP request to a single upstream", long_about = None)]
pub struct Cli {
    /// Upstream to forward to, as [http://]host:port
    #[arg(short = 'd', long = "dest", value_name = "ADDR")]
    pub dest: String,

    /// Address to listen on, as [http://]host:port
    #[arg(short = 'u', long = "url", value_name = "ADDR")]
    pub url: String,

    /// Log file (appended to), or "stdout"
    #[arg(short = 'l', long = "log", value_name = "PATH")]
    pub log: Option<String>,

    /// Optional TOML settings file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse `args` (including the program name) without exiting the process.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map_err(|e| match e.kind() {
            ErrorKind::MissingRequiredArgument => ConfigError::MissingArguments(e),
            _ => ConfigError::Usage(e),
        })
    }

    pub fn log_target(&self) -> LogTarget {
        LogTarget::from_arg(self.log.as_deref())
    }

    /// Settings from `--config`, or the defaults when no file was given.
    pub fn settings(&self) -> Result<FileConfig, ConfigError> {
        match &self.config {
            Some(path) => config::loader::load_config(path),
            None => Ok(FileConfig::default()),
        }
    }

    /// Validate the addresses and combine them with `settings`.
    pub fn into_config(self, settings: FileConfig) -> Result<ProxyConfig, ConfigError> {
        let log = self.log_target();
        let upstream = config::resolve(&self.dest)?;
        let listen = ListenAddress::parse(&self.url)?;

        let mut config = ProxyConfig::with_settings(listen, upstream, settings);
        config.log = log;
        Ok(config)
    }
}
