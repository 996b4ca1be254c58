//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The two upstream services requests are forwarded to.
    pub upstreams: UpstreamsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Analytics capture and sink settings.
    pub analytics: AnalyticsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8787").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
        }
    }
}

/// Upstream base URLs.
///
/// Both are required; an empty value fails validation.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamsConfig {
    /// Base URL of the Load-Service (receives `POST /pdf/load`).
    pub load_service_url: String,

    /// Base URL of the Query-Service (receives `POST /pdf/query` and all other traffic).
    pub query_service_url: String,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole inbound request deadline in seconds.
    pub request_secs: u64,

    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream call timeout (connect + response headers + body) in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            connect_secs: 5,
            upstream_secs: 25,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Where analytics events are written.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Events are written as structured log lines.
    #[default]
    Log,
    /// Events are POSTed as JSON to a collector.
    Http {
        endpoint: String,
        #[serde(default)]
        api_token: Option<String>,
    },
    /// Events are not captured at all.
    Disabled,
}

/// What happens to queued analytics events when the process shuts down.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryGuarantee {
    /// Stop writing as soon as shutdown is signalled.
    BestEffort,
    /// Keep writing queued events until empty or the drain timeout elapses.
    #[default]
    DrainOnShutdown,
}

/// Header names edge metadata is read from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeHeadersConfig {
    /// Ray-style header; the datacenter is the suffix after the last `-`.
    pub datacenter: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
}

impl Default for EdgeHeadersConfig {
    fn default() -> Self {
        Self {
            datacenter: "cf-ray".to_string(),
            country: "cf-ipcountry".to_string(),
            city: "cf-ipcity".to_string(),
            region: "cf-region".to_string(),
            timezone: "cf-timezone".to_string(),
        }
    }
}

/// Analytics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Enable analytics capture.
    pub enabled: bool,

    /// Sink events are written to.
    pub sink: SinkConfig,

    /// Bounded queue between request handlers and the sink writer.
    pub queue_capacity: usize,

    /// Shutdown behavior for queued events.
    pub delivery: DeliveryGuarantee,

    /// Upper bound on the shutdown drain, in seconds.
    pub drain_timeout_secs: u64,

    /// Per-event sink write timeout, in seconds.
    pub write_timeout_secs: u64,

    /// Header carrying the client IP.
    pub client_ip_header: String,

    /// Use the socket peer address when the client IP header is missing.
    pub peer_address_fallback: bool,

    pub edge_headers: EdgeHeadersConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sink: SinkConfig::default(),
            queue_capacity: 1024,
            delivery: DeliveryGuarantee::default(),
            drain_timeout_secs: 5,
            write_timeout_secs: 5,
            client_ip_header: "cf-connecting-ip".to_string(),
            peer_address_fallback: false,
            edge_headers: EdgeHeadersConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Whether events are built and queued at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.sink != SinkConfig::Disabled
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
