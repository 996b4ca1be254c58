//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the ordered rule table
//! - Resolve a request into an upstream target and forwarding payload
//! - Forward through an `UpstreamClient` and hand back its response
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan of rules; first match wins
//! - Explicit NoMatch rather than silent default for custom tables
//! - Never retries; a transport failure is returned as-is

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use thiserror::Error;

use crate::config::UpstreamsConfig;
use crate::http::request::IncomingRequest;
use crate::routing::matcher::{method_and_path, AnyMatcher, Matcher};
use crate::upstream::{ProxiedResponse, UpstreamClient, UpstreamError, UpstreamTarget};

pub const LOAD_PATH: &str = "/pdf/load";
pub const QUERY_PATH: &str = "/pdf/query";

/// The two upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Load,
    Query,
}

/// Path sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPath {
    /// Always this path.
    Fixed(String),
    /// The inbound path and query string, unchanged.
    Original,
}

/// Method sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMethod {
    Fixed(Method),
    Original,
}

/// Whether the inbound body travels upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Forward the body byte-for-byte.
    Always,
    /// Forward the body unless the upstream method is GET or HEAD,
    /// in which case it is silently dropped.
    UnlessGetOrHead,
}

/// A single dispatch rule.
#[derive(Debug)]
pub struct Route {
    pub name: &'static str,
    pub matcher: Box<dyn Matcher>,
    pub service: Service,
    pub path: TargetPath,
    pub method: TargetMethod,
    pub body: BodyPolicy,
}

/// Everything needed for the outbound call.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub route: &'static str,
    pub target: UpstreamTarget,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Successful forward: the matched rule and the upstream's response.
#[derive(Debug)]
pub struct Routed {
    pub route: &'static str,
    pub response: ProxiedResponse,
}

/// Router-level failures.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no route matched {method} {path}")]
    NoMatch { method: Method, path: String },

    #[error("route {route}: {source}")]
    Upstream {
        route: &'static str,
        #[source]
        source: UpstreamError,
    },
}

/// Immutable, ordered rule table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    load_service_url: String,
    query_service_url: String,
}

impl Router {
    /// Build the standard table: `POST /pdf/load`, `POST /pdf/query`, catch-all.
    pub fn from_config(upstreams: &UpstreamsConfig) -> Self {
        Self::with_routes(upstreams, default_routes())
    }

    /// Build a router over a custom rule table. Rules are evaluated in order.
    pub fn with_routes(upstreams: &UpstreamsConfig, routes: Vec<Route>) -> Self {
        for route in &routes {
            tracing::debug!(route = route.name, service = ?route.service, "Route registered");
        }
        Self {
            routes,
            load_service_url: upstreams.load_service_url.clone(),
            query_service_url: upstreams.query_service_url.clone(),
        }
    }

    /// Select the first matching rule and derive the outbound call.
    pub fn resolve(&self, req: &IncomingRequest) -> Option<Dispatch> {
        let route = self.routes.iter().find(|r| r.matcher.matches(req))?;

        let method = match &route.method {
            TargetMethod::Fixed(m) => m.clone(),
            TargetMethod::Original => req.method.clone(),
        };
        let path = match &route.path {
            TargetPath::Fixed(p) => p.clone(),
            TargetPath::Original => req.path_and_query().to_string(),
        };
        let base_url = match route.service {
            Service::Load => self.load_service_url.clone(),
            Service::Query => self.query_service_url.clone(),
        };
        let body = match route.body {
            BodyPolicy::Always => Some(req.body.clone()),
            BodyPolicy::UnlessGetOrHead if method == Method::GET || method == Method::HEAD => None,
            BodyPolicy::UnlessGetOrHead => Some(req.body.clone()),
        };

        Some(Dispatch {
            route: route.name,
            target: UpstreamTarget { base_url, path, method },
            headers: req.headers.clone(),
            body,
        })
    }

    /// Resolve and forward. One outbound call at most, no retries.
    pub async fn route(
        &self,
        upstream: &dyn UpstreamClient,
        req: &IncomingRequest,
    ) -> Result<Routed, RouteError> {
        let dispatch = self.resolve(req).ok_or_else(|| RouteError::NoMatch {
            method: req.method.clone(),
            path: req.path().to_string(),
        })?;

        tracing::debug!(
            route = dispatch.route,
            method = %dispatch.target.method,
            url = %dispatch.target.url(),
            has_body = dispatch.body.is_some(),
            "Forwarding request"
        );

        let response = upstream
            .forward(&dispatch.target, dispatch.headers, dispatch.body)
            .await
            .map_err(|source| RouteError::Upstream {
                route: dispatch.route,
                source,
            })?;

        Ok(Routed {
            route: dispatch.route,
            response,
        })
    }
}

fn default_routes() -> Vec<Route> {
    vec![
        Route {
            name: "pdf_load",
            matcher: Box::new(method_and_path(Method::POST, LOAD_PATH)),
            service: Service::Load,
            path: TargetPath::Fixed(LOAD_PATH.to_string()),
            method: TargetMethod::Fixed(Method::POST),
            body: BodyPolicy::Always,
        },
        Route {
            name: "pdf_query",
            matcher: Box::new(method_and_path(Method::POST, QUERY_PATH)),
            service: Service::Query,
            path: TargetPath::Fixed(QUERY_PATH.to_string()),
            method: TargetMethod::Fixed(Method::POST),
            body: BodyPolicy::Always,
        },
        Route {
            name: "passthrough",
            matcher: Box::new(AnyMatcher),
            service: Service::Query,
            path: TargetPath::Original,
            method: TargetMethod::Original,
            body: BodyPolicy::UnlessGetOrHead,
        },
    ]
}
