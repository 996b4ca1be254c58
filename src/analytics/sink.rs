//! Analytics sinks.
//!
//! A sink is a write-only collector. It offers no read API and no delivery
//! guarantee; the emitter treats every error as final.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::analytics::event::AnalyticsEvent;
use crate::config::SinkConfig;

/// Failures writing to a sink. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("sink rejected event with status {0}")]
    Rejected(u16),

    #[error("sink write timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid sink configuration: {0}")]
    Config(String),
}

/// Append-only event collector shared by all requests.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn write_data_point(&self, event: &AnalyticsEvent) -> Result<(), SinkError>;
}

/// Writes events as structured log lines under the `analytics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AnalyticsSink for LogSink {
    async fn write_data_point(&self, event: &AnalyticsEvent) -> Result<(), SinkError> {
        let blobs = serde_json::to_string(&event.data_fields)
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        tracing::info!(
            target: "analytics",
            indexes = ?event.index_keys,
            blobs = %blobs,
            "data point"
        );
        Ok(())
    }
}

/// POSTs each event as JSON to a collector endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    api_token: Option<String>,
}

impl HttpSink {
    pub fn new(endpoint: &str, api_token: Option<String>) -> Result<Self, SinkError> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| SinkError::Config(e.to_string()))?;
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| SinkError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_token,
        })
    }
}

#[async_trait]
impl AnalyticsSink for HttpSink {
    async fn write_data_point(&self, event: &AnalyticsEvent) -> Result<(), SinkError> {
        let mut request = self.client.post(self.endpoint.clone()).json(event);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Rejected(response.status().as_u16()))
        }
    }
}

/// Build the configured sink. `Disabled` yields `None`.
pub fn build_sink(config: &SinkConfig) -> Result<Option<Arc<dyn AnalyticsSink>>, SinkError> {
    let sink: Arc<dyn AnalyticsSink> = match config {
        SinkConfig::Log => Arc::new(LogSink),
        SinkConfig::Http { endpoint, api_token } => Arc::new(HttpSink::new(endpoint, api_token.clone())?),
        SinkConfig::Disabled => return Ok(None),
    };
    Ok(Some(sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn event() -> AnalyticsEvent {
        AnalyticsEvent {
            index_keys: vec!["203.0.113.7".into()],
            data_fields: vec![vec![json!("edge.example"), json!("/status"), json!("\"\"")]],
        }
    }

    async fn start_collector(status: u16) -> (String, mpsc::UnboundedReceiver<(Option<String>, serde_json::Value)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new()
            .route(
                "/events",
                post(
                    move |State(tx): State<mpsc::UnboundedSender<(Option<String>, serde_json::Value)>>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let _ = tx.send((auth, body));
                        axum::http::StatusCode::from_u16(status).unwrap()
                    },
                ),
            )
            .with_state(tx);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/events", addr), rx)
    }

    #[tokio::test]
    async fn test_http_sink_posts_event_json() {
        let (endpoint, mut rx) = start_collector(204).await;
        let sink = HttpSink::new(&endpoint, Some("secret".into())).unwrap();

        sink.write_data_point(&event()).await.unwrap();

        let (auth, body) = rx.recv().await.unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer secret"));
        assert_eq!(body["indexes"], json!(["203.0.113.7"]));
        assert_eq!(body["blobs"][0][1], json!("/status"));
    }

    #[tokio::test]
    async fn test_http_sink_non_success_is_rejected() {
        let (endpoint, _rx) = start_collector(503).await;
        let sink = HttpSink::new(&endpoint, None).unwrap();

        let err = sink.write_data_point(&event()).await.unwrap_err();
        assert!(matches!(err, SinkError::Rejected(503)));
    }

    #[tokio::test]
    async fn test_log_sink_accepts_events() {
        LogSink.write_data_point(&event()).await.unwrap();
    }

    #[test]
    fn test_build_sink() {
        assert!(build_sink(&SinkConfig::Log).unwrap().is_some());
        assert!(build_sink(&SinkConfig::Disabled).unwrap().is_none());
        assert!(matches!(
            build_sink(&SinkConfig::Http { endpoint: "::nope".into(), api_token: None }),
            Err(SinkError::Config(_))
        ));
    }
}
