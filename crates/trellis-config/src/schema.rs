//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};
use trellis_core::DEFAULT_NAMESPACE;
use trellis_telemetry::LogFormat;

/// Application section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application name, used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Deployment environment (e.g. "production", "development").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Include error details in 500 responses.
    #[serde(default)]
    pub debug: bool,

    /// Namespace prefixed to bare controller names in action references.
    #[serde(default = "default_controller_namespace")]
    pub controller_namespace: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_environment(),
            debug: false,
            controller_namespace: default_controller_namespace(),
        }
    }
}

fn default_app_name() -> String {
    "trellis".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_controller_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Routing section.
///
/// # Example
///
/// ```
/// use trellis_config::RoutingConfig;
///
/// let routing = RoutingConfig::default();
/// assert!(!routing.method_not_allowed);
/// assert!(!routing.expose_route_list);
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Answer 405 with an `Allow` header, instead of 404, when the path is
    /// declared under other methods only.
    #[serde(default)]
    pub method_not_allowed: bool,

    /// Serve the JSON route listing at `/_routes`.
    #[serde(default)]
    pub expose_route_list: bool,
}

/// Server configuration section.
///
/// Controls the HTTP adapter: bind address, timeouts and body limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Record request metrics and serve them in Prometheus format.
    #[serde(default)]
    pub enabled: bool,

    /// Path of the scrape route.
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_metrics_path(),
        }
    }
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.http_addr, "0.0.0.0:8080");
        assert_eq!(server.request_timeout_ms, 30000);
        assert_eq!(server.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let app: AppConfig = toml::from_str(r#"name = "blog""#).unwrap();
        assert_eq!(app.name, "blog");
        assert_eq!(app.controller_namespace, "app::controllers");
        assert!(!app.debug);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<RoutingConfig, _> = toml::from_str("strict_slashes = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_from_toml() {
        let logging: LoggingConfig = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(logging.format, LogFormat::Pretty);
        assert!(logging.enabled);
    }
}
