//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Request};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream;
use hostrelay::config::{resolve, FileConfig, ListenAddress, TimeoutConfig};
use hostrelay::observability::{LogSink, Logger};
use hostrelay::{HttpServer, ProxyConfig, Shutdown};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::EnvFilter;

/// In-memory log sink.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A running proxy. Shuts down when dropped.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub logs: LogBuffer,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(upstream: SocketAddr) -> TestProxy {
    start_proxy_with(upstream, TimeoutConfig::default()).await
}

pub async fn start_proxy_with(upstream: SocketAddr, timeouts: TimeoutConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let settings = FileConfig {
        timeouts,
        ..FileConfig::default()
    };
    let config = ProxyConfig::with_settings(
        ListenAddress::parse(&addr.to_string()).unwrap(),
        resolve(&upstream.to_string()).unwrap(),
        settings,
    );

    let logs = LogBuffer::default();
    let logger = Logger::new(LogSink::from_writer(logs.clone()), EnvFilter::new("info"));

    let shutdown = Shutdown::new();
    let signal = shutdown.signal();
    let server = HttpServer::new(config, logger);
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    TestProxy {
        addr,
        logs,
        shutdown,
    }
}

/// Serve `router` on a fresh local port.
pub async fn start_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Upstream with a few test endpoints; anything else is described back as JSON.
pub fn test_upstream() -> Router {
    Router::new()
        .route("/bytes/{n}", get(stream_bytes))
        .route("/echo", post(echo))
        .route("/greet/{name}", get(greet))
        .fallback(inspect)
}

async fn inspect(request: Request) -> Json<Value> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .map(|v| Value::from(v.to_str().unwrap()))
            .unwrap_or(Value::Null)
    };

    Json(json!({
        "method": parts.method.as_str(),
        "path_and_query": parts.uri.path_and_query().map(|pq| pq.as_str()),
        "host": header("host"),
        "x_forwarded_for": header("x-forwarded-for"),
        "x_forwarded_for_count": parts.headers.get_all("x-forwarded-for").iter().count(),
        "x_hop": header("x-hop"),
        "keep_alive": header("keep-alive"),
        "body_len": body.len(),
    }))
}

async fn echo(body: Body) -> Body {
    body
}

async fn greet(Path(name): Path<String>) -> String {
    tokio::time::sleep(Duration::from_millis(100)).await;
    format!("hello {name}\n").repeat(2000)
}

/// The byte at `offset` of every generated body.
pub fn pattern_byte(offset: usize) -> u8 {
    (offset % 251) as u8
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(pattern_byte).collect()
}

/// Streams `n` bytes in 64 KiB chunks, without a Content-Length.
async fn stream_bytes(Path(n): Path<usize>) -> Body {
    const CHUNK: usize = 64 * 1024;
    let chunks = (0..n).step_by(CHUNK).map(move |start| {
        let end = (start + CHUNK).min(n);
        Ok::<_, io::Error>(Bytes::from((start..end).map(pattern_byte).collect::<Vec<_>>()))
    });
    Body::from_stream(stream::iter(chunks.collect::<Vec<_>>()))
}

/// Raw TCP upstream: `handler` gets every accepted socket.
pub async fn start_raw_upstream<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            tokio::spawn(async move { handler(socket).await });
        }
    });
    addr
}

/// Read from `socket` until the end of the request headers.
pub async fn read_request_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    head
}

/// A free local port nothing listens on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Raw response split into head and body.
pub struct RawResponse {
    pub local_addr: SocketAddr,
    pub head: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn status(&self) -> u16 {
        self.head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Send `head` verbatim (it must ask for `Connection: close`) and read the
/// whole response.
pub async fn raw_request(proxy: SocketAddr, head: &str) -> RawResponse {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    let local_addr = stream.local_addr().unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    RawResponse {
        local_addr,
        head: String::from_utf8(raw[..split].to_vec()).unwrap(),
        body: raw[split + 4..].to_vec(),
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
