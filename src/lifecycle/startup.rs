//! Startup orchestration.
//!
//! Open the log sink → load settings → resolve addresses → start metrics →
//! bind → serve. Any error before serving is fatal and is reported on the log
//! sink (except a log sink that cannot be opened, which goes to stderr).

use std::net::SocketAddr;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::listener::{self, ListenerError};
use crate::observability::logging::{self, LogSink, Logger};
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to open log sink: {0}")]
    LogSink(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bind(#[from] ListenerError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl StartupError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(e) => e.exit_code(),
            _ => 1,
        }
    }

    /// Whether the error could not be written to the log sink.
    pub fn needs_stderr(&self) -> bool {
        matches!(self, StartupError::LogSink(_))
    }
}

/// Run the proxy described by `cli` until `shutdown` fires.
pub async fn launch(cli: Cli, shutdown: Shutdown) -> Result<(), StartupError> {
    let sink = LogSink::open(&cli.log_target()).map_err(StartupError::LogSink)?;

    let settings = cli.settings();
    let filter = match &settings {
        Ok(settings) => logging::env_filter(&settings.observability.log_level),
        Err(_) => logging::env_filter("info"),
    };
    let logger = Logger::new(sink, filter);
    if logger.install_global().is_err() {
        tracing::debug!("A global subscriber is already installed");
    }

    let settings = settings.map_err(|e| logger.fatal(e))?;
    let config = cli.into_config(settings).map_err(|e| logger.fatal(e))?;

    if let Some(addr) = &config.observability.metrics_address {
        // Already validated as a socket address.
        if let Ok(addr) = addr.parse::<SocketAddr>() {
            metrics::init_metrics(addr).map_err(|e| logger.fatal(e))?;
        }
    }

    logger.startup(&config.upstream, &config.listen);

    let listener = listener::bind(&config.listen)
        .await
        .map_err(|e| logger.fatal(e))?;

    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown.clone(), logger.clone()));

    HttpServer::new(config, logger.clone())
        .run(listener, shutdown.signal())
        .await
        .map_err(|e| logger.fatal(StartupError::Serve(e)))
}
