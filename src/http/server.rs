//! HTTP server setup and the edge handler.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all edge handler
//! - Wire up middleware (tracing, timeout, body limit)
//! - Buffer each request once and fork it into routing and analytics
//! - Run the analytics worker alongside the server and stop it after
//!   in-flight requests finish
//!
//! # Request States
//! ```text
//! Start ─sniff body─▶ BodySniffed ─router─▶ Routed ─queue event─▶ Emitted ─▶ Done
//!   │                                         │
//!   └─ invalid JSON ─▶ Error (400)            └─ transport failure ─▶ 502
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::analytics::{
    build_sink, AnalyticsEmitter, AnalyticsEvent, AnalyticsSink, AnalyticsWorker, CapturedBody,
    ResponseSummary, WorkerSettings, WorkerStats,
};
use crate::config::{AnalyticsConfig, EdgeConfig};
use crate::http::request::IncomingRequest;
use crate::http::response::EdgeError;
use crate::lifecycle::startup::StartupError;
use crate::observability::metrics;
use crate::routing::{RouteError, Router as EdgeRouter};
use crate::upstream::{HttpUpstream, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EdgeRouter>,
    pub upstream: Arc<dyn UpstreamClient>,
    pub analytics: AnalyticsEmitter,
    pub capture: Arc<AnalyticsConfig>,
}

/// HTTP server for the edge router.
pub struct HttpServer {
    app: Router,
    config: EdgeConfig,
    worker: Option<AnalyticsWorker>,
}

impl HttpServer {
    /// Create a server with the real upstream client and the configured sink.
    pub fn new(config: EdgeConfig) -> Result<Self, StartupError> {
        let upstream = Arc::new(HttpUpstream::new(&config.timeouts)?);
        let sink = if config.analytics.is_active() {
            build_sink(&config.analytics.sink)?
        } else {
            None
        };
        Ok(Self::with_components(config, upstream, sink))
    }

    /// Create a server around caller-supplied collaborators.
    pub fn with_components(
        config: EdgeConfig,
        upstream: Arc<dyn UpstreamClient>,
        sink: Option<Arc<dyn AnalyticsSink>>,
    ) -> Self {
        let router = Arc::new(EdgeRouter::from_config(&config.upstreams));

        let (analytics, worker) = match sink {
            Some(sink) if config.analytics.enabled => {
                let (emitter, queue) = AnalyticsEmitter::channel(config.analytics.queue_capacity);
                let worker = queue.into_worker(sink, WorkerSettings::from(&config.analytics));
                (emitter, Some(worker))
            }
            _ => (AnalyticsEmitter::disabled(), None),
        };

        let state = AppState {
            router,
            upstream,
            analytics,
            capture: Arc::new(config.analytics.clone()),
        };

        let app = build_app(&config, state);
        Self { app, config, worker }
    }

    /// The fully layered Axum router.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then finish the analytics worker.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<WorkerStats, std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let (worker_stop, worker_rx) = broadcast::channel(1);
        let worker = self.worker.map(|worker| tokio::spawn(worker.run(worker_rx)));

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");

        // Handlers queue their event before returning, so everything from
        // in-flight requests is in the queue by now.
        let _ = worker_stop.send(());
        let stats = match worker {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Analytics worker panicked");
                WorkerStats::default()
            }),
            None => WorkerStats::default(),
        };
        Ok(stats)
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub(crate) fn build_app(config: &EdgeConfig, state: AppState) -> Router {
    Router::new()
        .route("/{*path}", any(edge_handler))
        .route("/", any(edge_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
}

/// Entry point for every inbound request.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = Uuid::new_v4();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let span = tracing::info_span!(
        "edge",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    handle(state, request, peer).instrument(span).await
}

async fn handle(state: AppState, request: Request<Body>, peer: Option<SocketAddr>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    // Buffer once; router and analytics each get a view of the same bytes.
    // Size is capped by the body limit layer.
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            let err = EdgeError::BodyRead(e);
            metrics::record_request(&method, "none", err.status().as_u16(), start_time);
            return err.into_response();
        }
    };
    let req = IncomingRequest::from_parts(parts, body, &state.capture, peer);

    // Start → BodySniffed
    let captured = match CapturedBody::sniff(&req.headers, &req.body) {
        Ok(captured) => captured,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting request: body is not valid JSON");
            let err = EdgeError::InvalidJson(e);
            metrics::record_request(&method, "none", err.status().as_u16(), start_time);
            return err.into_response();
        }
    };

    // BodySniffed → Routed
    let outcome = state.router.route(state.upstream.as_ref(), &req).await;

    // Routed → Emitted
    if state.analytics.is_enabled() {
        let summary = match &outcome {
            Ok(routed) => ResponseSummary::new(routed.response.status, routed.response.headers.clone()),
            Err(_) => ResponseSummary::unreachable(),
        };
        // Queued before the handler returns so graceful shutdown never
        // outruns an event. `emit` uses `try_send` and never waits.
        let event = AnalyticsEvent::capture(&req, &captured, &summary);
        state.analytics.emit(event);
    }

    // Emitted → Done
    match outcome {
        Ok(routed) => {
            let status = routed.response.status;
            tracing::debug!(route = routed.route, status = %status, "Upstream responded");
            metrics::record_request(&method, routed.route, status.as_u16(), start_time);
            routed.response.into_response()
        }
        Err(e) => {
            let route = match &e {
                RouteError::Upstream { route, .. } => {
                    metrics::record_upstream_error(*route);
                    *route
                }
                RouteError::NoMatch { .. } => "none",
            };
            tracing::error!(route, error = %e, "Upstream error");
            let err = EdgeError::from(e);
            metrics::record_request(&method, route, err.status().as_u16(), start_time);
            err.into_response()
        }
    }
}
