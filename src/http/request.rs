//! Inbound request capture.
//!
//! # Responsibilities
//! - Buffer the inbound body exactly once
//! - Extract routing-relevant information (method, path, query)
//! - Extract analytics metadata (client IP, edge location headers)
//!
//! # Design Decisions
//! - The body is held as `Bytes`; the router and the analytics path each get
//!   a cheap reference-counted view, so neither can starve the other
//! - Nothing here rewrites headers; the forwarded copy is the original

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{request::Parts, HeaderMap, Method, Uri};

use crate::config::{AnalyticsConfig, EdgeHeadersConfig};

/// Location metadata attached to the request by the edge network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeMetadata {
    pub datacenter: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub timezone: Option<String>,
}

impl EdgeMetadata {
    /// Read edge metadata from the configured headers.
    ///
    /// Returns `None` when none of the headers are present.
    pub fn from_headers(headers: &HeaderMap, names: &EdgeHeadersConfig) -> Option<Self> {
        let metadata = Self {
            datacenter: header_string(headers, &names.datacenter).map(|ray| datacenter_from_ray(&ray)),
            country: header_string(headers, &names.country),
            city: header_string(headers, &names.city),
            region: header_string(headers, &names.region),
            timezone: header_string(headers, &names.timezone),
        };

        if metadata == Self::default() {
            None
        } else {
            Some(metadata)
        }
    }
}

/// Ray IDs look like `8a1b2c3d4e5f6a7b-SJC`; the datacenter is the suffix.
fn datacenter_from_ray(ray: &str) -> String {
    match ray.rsplit_once('-') {
        Some((_, colo)) if !colo.is_empty() => colo.to_string(),
        _ => ray.to_string(),
    }
}

/// A fully buffered inbound request.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_ip: Option<String>,
    pub edge: Option<EdgeMetadata>,
}

impl IncomingRequest {
    /// Assemble a request from its head and an already-buffered body.
    pub fn from_parts(
        parts: Parts,
        body: Bytes,
        capture: &AnalyticsConfig,
        peer: Option<SocketAddr>,
    ) -> Self {
        let client_ip = header_string(&parts.headers, &capture.client_ip_header).or_else(|| {
            peer.filter(|_| capture.peer_address_fallback)
                .map(|addr| addr.ip().to_string())
        });
        let edge = EdgeMetadata::from_headers(&parts.headers, &capture.edge_headers);

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            client_ip,
            edge,
        }
    }

    /// URL path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// URL path including the query string, as received.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
