//! Typed configuration for Trellis applications.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment variable overrides
//! - Strict parsing (unknown fields are errors) and validation
//!
//! # Overview
//!
//! [`TrellisConfig`] holds every section:
//!
//! - [`AppConfig`] - name, environment, debug mode, controller namespace
//! - [`RoutingConfig`] - 405 responses and the route listing
//! - [`ServerConfig`] - bind address, timeouts, body limit
//! - [`LoggingConfig`] / [`MetricsConfig`] - observability
//!
//! # Configuration File Format
//!
//! ```toml
//! [app]
//! name = "blog"
//! environment = "production"
//! debug = false
//! controller_namespace = "app::controllers"
//!
//! [routing]
//! method_not_allowed = false
//! expose_route_list = false
//!
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 2097152
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! path = "/metrics"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `TRELLIS__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `TRELLIS__ROUTING__METHOD_NOT_ALLOWED=true`
//! - `TRELLIS__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{TrellisConfig, TrellisConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{AppConfig, LoggingConfig, MetricsConfig, RoutingConfig, ServerConfig};
pub use trellis_telemetry::LogFormat;
