//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Upstream and sink URLs must be absolute http(s) URLs
//! - Validate value ranges (timeouts > 0, queue capacity > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{EdgeConfig, SinkConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} is not a valid http(s) URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(
        &mut errors,
        "upstreams.load_service_url",
        &config.upstreams.load_service_url,
    );
    check_url(
        &mut errors,
        "upstreams.query_service_url",
        &config.upstreams.query_service_url,
    );

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    check_positive(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);
    check_positive(&mut errors, "timeouts.connect_secs", config.timeouts.connect_secs);
    check_positive(&mut errors, "timeouts.upstream_secs", config.timeouts.upstream_secs);
    check_positive(&mut errors, "limits.max_body_size", config.limits.max_body_size as u64);

    let analytics = &config.analytics;
    if analytics.is_active() {
        check_positive(&mut errors, "analytics.queue_capacity", analytics.queue_capacity as u64);
        check_positive(&mut errors, "analytics.write_timeout_secs", analytics.write_timeout_secs);
        if analytics.client_ip_header.trim().is_empty() {
            errors.push(ValidationError::Missing { field: "analytics.client_ip_header" });
        }
        if let SinkConfig::Http { endpoint, .. } = &analytics.sink {
            check_url(&mut errors, "analytics.sink.endpoint", endpoint);
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Missing { field });
        return;
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            reason: e.to_string(),
        }),
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> EdgeConfig {
        let mut config = EdgeConfig::default();
        config.upstreams.load_service_url = "http://db.internal:8080".into();
        config.upstreams.query_service_url = "https://q.example".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_default_config_reports_both_missing_upstreams() {
        let errors = validate_config(&EdgeConfig::default()).unwrap_err();
        assert!(errors.contains(&ValidationError::Missing { field: "upstreams.load_service_url" }));
        assert!(errors.contains(&ValidationError::Missing { field: "upstreams.query_service_url" }));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = valid_config();
        config.upstreams.query_service_url = "ftp://q.example".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ValidationError::InvalidUrl { field: "upstreams.query_service_url", .. }
        ));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.upstream_secs = 0;
        config.analytics.queue_capacity = 0;
        config.analytics.sink = SinkConfig::Http {
            endpoint: "collector".into(),
            api_token: None,
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_disabled_analytics_skips_analytics_checks() {
        let mut config = valid_config();
        config.analytics.enabled = false;
        config.analytics.queue_capacity = 0;
        config.analytics.client_ip_header = String::new();

        assert_eq!(validate_config(&config), Ok(()));
    }
}
