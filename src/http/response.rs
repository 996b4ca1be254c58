//! Client-visible error responses.
//!
//! # Responsibilities
//! - Map edge failures to HTTP status codes
//! - Keep upstream responses (including 4xx/5xx) untouched; only failures
//!   originating here are rendered by this module
//!
//! # Design Decisions
//! - Malformed JSON body → 400, nothing proxied, nothing emitted
//! - Transport failure reaching an upstream → 502
//! - Analytics failures never reach this module

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routing::RouteError;

/// Failures that end a request at the edge.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// Body declared JSON but does not parse.
    #[error("Invalid JSON in request body")]
    InvalidJson(#[source] serde_json::Error),

    /// The inbound body could not be read.
    #[error("Failed to read request body")]
    BodyRead(#[source] axum::Error),

    /// Routing or the upstream call failed.
    #[error("Upstream request failed")]
    Upstream(#[from] RouteError),
}

impl EdgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::InvalidJson(_) | EdgeError::BodyRead(_) => StatusCode::BAD_REQUEST,
            EdgeError::Upstream(RouteError::NoMatch { .. }) => StatusCode::NOT_FOUND,
            EdgeError::Upstream(RouteError::Upstream { .. }) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let body = match &self {
            EdgeError::Upstream(RouteError::NoMatch { .. }) => "No matching route found".to_string(),
            other => other.to_string(),
        };
        (self.status(), body).into_response()
    }
}
