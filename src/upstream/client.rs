//! HTTP upstream client.
//!
//! # Responsibilities
//! - Issue one outbound call per forward
//! - Copy caller headers except those the transport owns
//! - Stream the upstream body back without buffering
//!
//! # Design Decisions
//! - Redirects are returned to the caller, never followed
//! - Connect and total timeouts are enforced by the transport
//! - Timeout and connect failures are reported separately for logs

use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};

use crate::config::TimeoutConfig;
use crate::upstream::{ProxiedResponse, UpstreamClient, UpstreamError, UpstreamTarget};

/// `reqwest`-backed upstream client shared by all requests.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build a client with the configured deadlines.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn forward(
        &self,
        target: &UpstreamTarget,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<ProxiedResponse, UpstreamError> {
        let url = target.url();
        let url = reqwest::Url::parse(&url).map_err(|e| UpstreamError::InvalidTarget {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let mut request = self
            .client
            .request(target.method.clone(), url)
            .headers(forwardable_headers(headers));
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(classify)?;

        let status = response.status();
        let headers = response.headers().clone();
        Ok(ProxiedResponse {
            status,
            headers,
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}

/// Drop headers describing the inbound framing; the transport recomputes them
/// from the body actually sent. Everything else is kept as-is.
pub(crate) fn forwardable_headers(mut headers: HeaderMap) -> HeaderMap {
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);
    headers
}

fn classify(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout(err.to_string())
    } else if err.is_connect() {
        UpstreamError::Connect(err.to_string())
    } else {
        UpstreamError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_forwardable_headers_keeps_caller_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "edge.example".parse().unwrap());
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        headers.insert(header::CONTENT_LENGTH, "9".parse().unwrap());
        headers.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.append("x-trace", "a".parse().unwrap());
        headers.append("x-trace", "b".parse().unwrap());

        let forwarded = forwardable_headers(headers);

        assert_eq!(forwarded[header::HOST], "edge.example");
        assert_eq!(forwarded[header::CONTENT_TYPE], "application/json");
        assert!(forwarded.get(header::CONTENT_LENGTH).is_none());
        assert!(forwarded.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(forwarded.get_all("x-trace").iter().count(), 2);
        assert!(forwarded.get("via").is_none());
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpUpstream::new(&TimeoutConfig::default()).unwrap();
        let target = UpstreamTarget {
            base_url: format!("http://{}", addr),
            path: "/status".into(),
            method: Method::GET,
        };

        let err = client.forward(&target, HeaderMap::new(), None).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Connect(_) | UpstreamError::Transport(_)));
    }

    #[tokio::test]
    async fn test_invalid_target_url() {
        let client = HttpUpstream::new(&TimeoutConfig::default()).unwrap();
        let target = UpstreamTarget {
            base_url: "not a url".into(),
            path: "/status".into(),
            method: Method::GET,
        };

        let err = client.forward(&target, HeaderMap::new(), None).await.unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidTarget { .. }));
    }
}
