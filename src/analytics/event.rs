//! Analytics event shape.
//!
//! ```text
//! indexes: [client IP | "undefined"]
//! blobs:   [[host, path, serializedBody],
//!           [datacenter, country, city, region, timezone, requestHeaders],
//!           [responseStatus, responseHeaders]]
//! ```

use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analytics::body::CapturedBody;
use crate::http::request::IncomingRequest;

/// Index key used when the client IP is unknown.
pub const UNKNOWN_CLIENT: &str = "undefined";

/// Host blob used when the request carries no `Host` header.
pub const DEFAULT_HOST: &str = "localhost";

/// One data point handed to the sink. Built once per request, never retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Low-cardinality grouping keys.
    #[serde(rename = "indexes")]
    pub index_keys: Vec<String>,

    #[serde(rename = "blobs")]
    pub data_fields: Vec<Vec<Value>>,
}

/// What the analytics path knows about the upstream response.
#[derive(Debug, Clone, Default)]
pub struct ResponseSummary {
    /// `None` when the upstream could not be reached.
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
}

impl ResponseSummary {
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status: Some(status),
            headers,
        }
    }

    /// Placeholder for a request whose upstream call failed.
    pub fn unreachable() -> Self {
        Self::default()
    }
}

impl AnalyticsEvent {
    /// Build the event for one request/response pair.
    pub fn capture(req: &IncomingRequest, body: &CapturedBody, response: &ResponseSummary) -> Self {
        let index = req
            .client_ip
            .clone()
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        let host = req.header("host").unwrap_or(DEFAULT_HOST);
        let request_blob = vec![
            Value::from(host),
            Value::from(req.path()),
            Value::from(body.serialized()),
        ];

        let edge = req.edge.clone().unwrap_or_default();
        let edge_blob = vec![
            Value::from(edge.datacenter),
            Value::from(edge.country),
            Value::from(edge.city),
            Value::from(edge.region),
            Value::from(edge.timezone),
            headers_to_json(&req.headers),
        ];

        let response_blob = vec![
            Value::from(response.status.map(|s| s.as_u16())),
            headers_to_json(&response.headers),
        ];

        Self {
            index_keys: vec![index],
            data_fields: vec![request_blob, edge_blob, response_blob],
        }
    }
}

/// Header map as a JSON object; repeated headers are joined with `", "`.
pub fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut object = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        object.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(object)
}
