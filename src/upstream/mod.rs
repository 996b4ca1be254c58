//! Upstream client subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamTarget (base URL + path, method) + headers + optional body
//!     → client.rs (one outbound call, no retries, no redirects)
//!     → ProxiedResponse (status, headers, streamed body) or UpstreamError
//! ```
//!
//! # Design Decisions
//! - A 4xx/5xx from the upstream is a successful proxy of an error response
//! - Only transport failures become `UpstreamError`
//! - The client sits behind a trait so the handler can be driven without sockets

pub mod client;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub use client::HttpUpstream;

/// Where a request is forwarded to. Built by the router, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub base_url: String,
    /// Path including any query string, always starting with `/`.
    pub path: String,
    pub method: Method,
}

impl UpstreamTarget {
    /// Absolute URL of the outbound call.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }
}

/// Upstream response passed back to the caller verbatim.
#[derive(Debug)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Errors reaching an upstream. Distinct from upstream error responses.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The target URL could not be built.
    #[error("invalid upstream URL {url}: {reason}")]
    InvalidTarget { url: String, reason: String },

    /// The upstream did not answer in time.
    #[error("upstream timed out: {0}")]
    Timeout(String),

    /// The connection could not be established (DNS, refused, TLS).
    #[error("upstream connection failed: {0}")]
    Connect(String),

    /// Any other transport-level failure.
    #[error("upstream request failed: {0}")]
    Transport(String),
}

/// Performs exactly one outbound call per invocation.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn forward(
        &self,
        target: &UpstreamTarget,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<ProxiedResponse, UpstreamError>;
}
