//! Structured logging.
//!
//! # Responsibilities
//! - Open the log sink chosen on the command line (stdout or an appended file)
//! - Build a `tracing` subscriber writing to that sink
//! - Hand it around as an explicit [`Logger`] instead of a process-wide writer
//!
//! Each event is formatted in full and handed to the sink in one write, so
//! lines from concurrent requests never interleave.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::sync::Mutex;

use axum::http::{Method, Uri};
use tracing::dispatcher::{self, Dispatch};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};
use tracing_subscriber::EnvFilter;

use crate::config::{ListenAddress, LogTarget, Upstream};

/// Destination for formatted log lines.
pub struct LogSink {
    writer: BoxMakeWriter,
    ansi: bool,
}

impl LogSink {
    /// Open `target`, creating the file if needed and appending to it.
    pub fn open(target: &LogTarget) -> io::Result<Self> {
        match target {
            LogTarget::Stdout => Ok(Self {
                writer: BoxMakeWriter::new(io::stdout),
                ansi: io::stdout().is_terminal(),
            }),
            LogTarget::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Self {
                    writer: BoxMakeWriter::new(Mutex::new(file)),
                    ansi: false,
                })
            }
        }
    }

    /// Wrap any writer, e.g. an in-memory buffer.
    pub fn from_writer<W>(writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            writer: BoxMakeWriter::new(writer),
            ansi: false,
        }
    }
}

/// Filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logging capability handed to every component that reports something.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    pub fn new(sink: LogSink, filter: EnvFilter) -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(sink.writer)
            .with_ansi(sink.ansi)
            .with_target(false)
            .finish();

        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Also route events emitted outside [`Logger`] (middleware, libraries)
    /// to this sink. Only the first call in a process succeeds.
    pub fn install_global(&self) -> Result<(), dispatcher::SetGlobalDefaultError> {
        dispatcher::set_global_default(self.dispatch.clone())
    }

    /// Run `f` with this logger as the current subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }

    pub fn startup(&self, upstream: &Upstream, listen: &ListenAddress) {
        self.in_scope(|| tracing::info!("Forwarding to {upstream}, listening on {listen}"));
    }

    /// One line per inbound request.
    pub fn request(&self, remote: SocketAddr, uri: &Uri) {
        self.in_scope(|| tracing::info!("{remote} requested {uri}"));
    }

    pub fn upstream_failure(&self, method: &Method, uri: &Uri, error: &dyn Display) {
        self.in_scope(|| tracing::warn!(%method, %uri, "upstream request failed: {error}"));
    }

    pub fn shutdown(&self) {
        self.in_scope(|| tracing::info!("Shutdown signal received"));
    }

    /// Log a fatal startup error and give it back for propagation.
    pub fn fatal<E: Display>(&self, error: E) -> E {
        self.in_scope(|| tracing::error!("{error}"));
        error
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Buffer;
    use super::*;

    fn logger() -> (Logger, Buffer) {
        let buffer = Buffer::default();
        let logger = Logger::new(LogSink::from_writer(buffer.clone()), EnvFilter::new("info"));
        (logger, buffer)
    }

    #[test]
    fn request_line_names_remote_and_url() {
        let (logger, buffer) = logger();
        let remote: SocketAddr = "10.1.2.3:45678".parse().unwrap();

        logger.request(remote, &Uri::from_static("/search?q=rust"));

        let contents = buffer.contents();
        let line = contents.lines().next().unwrap();
        assert!(line.ends_with("10.1.2.3:45678 requested /search?q=rust"), "{line}");
        assert!(line.contains("INFO"));
        assert!(line.starts_with(|c: char| c.is_ascii_digit()), "missing timestamp: {line}");
    }

    #[test]
    fn lines_keep_issue_order() {
        let (logger, buffer) = logger();
        let upstream = crate::config::resolve("127.0.0.1:9000").unwrap();
        let listen = ListenAddress::parse("127.0.0.1:8080").unwrap();
        let remote: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        logger.startup(&upstream, &listen);
        logger.request(remote, &Uri::from_static("/first"));
        logger.request(remote, &Uri::from_static("/second"));

        let contents = buffer.contents();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Forwarding to http://127.0.0.1:9000, listening on 127.0.0.1:8080"));
        assert!(lines[1].ends_with("requested /first"));
        assert!(lines[2].ends_with("requested /second"));
    }

    #[test]
    fn filter_drops_lower_levels() {
        let buffer = Buffer::default();
        let logger = Logger::new(LogSink::from_writer(buffer.clone()), EnvFilter::new("error"));

        logger.request("127.0.0.1:5000".parse().unwrap(), &Uri::from_static("/"));
        assert!(buffer.contents().is_empty());

        let err = logger.fatal("bind failed");
        assert_eq!(err, "bind failed");
        assert!(buffer.contents().contains("bind failed"));
    }

    #[test]
    fn file_sink_appends() {
        let path = std::env::temp_dir().join(format!("hostrelay-{}-append.log", std::process::id()));
        std::fs::write(&path, "existing line\n").unwrap();

        let sink = LogSink::open(&LogTarget::File(path.clone())).unwrap();
        let logger = Logger::new(sink, EnvFilter::new("info"));
        logger.request("127.0.0.1:5000".parse().unwrap(), &Uri::from_static("/appended"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("existing line\n"));
        assert!(contents.trim_end().ends_with("requested /appended"));

        std::fs::remove_file(path).unwrap();
    }
}
