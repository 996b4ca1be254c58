//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use pdf_edge_router::analytics::{AnalyticsEvent, AnalyticsSink, SinkError};
use pdf_edge_router::analytics::WorkerStats;
use pdf_edge_router::upstream::HttpUpstream;
use pdf_edge_router::{EdgeConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What a mock upstream saw.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Start a mock upstream that records every request.
///
/// It answers with the status named in `x-mock-status` (default 201),
/// an `x-backend` header, and a body of `<name>:<path>`.
pub async fn start_recording_backend(name: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();

    async fn record(
        State((name, tx)): State<(&'static str, mpsc::UnboundedSender<Recorded>)>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> impl IntoResponse {
        let status = headers
            .get("x-mock-status")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u16>().ok())
            .and_then(|v| StatusCode::from_u16(v).ok())
            .unwrap_or(StatusCode::CREATED);
        let reply = format!("{}:{}", name, uri.path());
        let _ = tx.send(Recorded { method, uri, headers, body });
        (status, [("x-backend", name), ("set-cookie", "session=abc")], reply)
    }

    let app = Router::new().fallback(record).with_state((name, tx));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, rx)
}

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct MemorySink {
    pub events: Mutex<Vec<AnalyticsEvent>>,
}

#[async_trait]
impl AnalyticsSink for MemorySink {
    async fn write_data_point(&self, event: &AnalyticsEvent) -> Result<(), SinkError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Sink that always fails.
pub struct BrokenSink;

#[async_trait]
impl AnalyticsSink for BrokenSink {
    async fn write_data_point(&self, _event: &AnalyticsEvent) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("collector offline".into()))
    }
}

/// Config pointing at the given upstreams.
pub fn config_for(load: SocketAddr, query: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstreams.load_service_url = format!("http://{}", load);
    config.upstreams.query_service_url = format!("http://{}", query);
    config
}

/// A running edge server.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<WorkerStats>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server and analytics worker to finish.
    pub async fn stop(self) -> WorkerStats {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap()
    }
}

/// Start the edge server on an ephemeral port.
pub async fn start_edge(config: EdgeConfig, sink: Option<Arc<dyn AnalyticsSink>>) -> RunningServer {
    let upstream = Arc::new(HttpUpstream::new(&config.timeouts).unwrap());
    let server = HttpServer::with_components(config, upstream, sink);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    RunningServer { addr, shutdown, handle }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
