//! Main configuration types.
//!
//! This module provides the top-level [`TrellisConfig`] struct and its builder.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use trellis_core::{KernelOptions, ROUTE_LIST_PATH};
use trellis_telemetry::{LogConfig, LogFormat, TelemetryConfig};

use crate::{AppConfig, ConfigError, LoggingConfig, MetricsConfig, RoutingConfig, ServerConfig};

/// Complete Trellis application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use trellis_config::TrellisConfig;
///
/// let config = TrellisConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(!config.routing.method_not_allowed);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TrellisConfig {
    /// Application settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Routing behavior.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl TrellisConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TrellisConfigBuilder {
        TrellisConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The server address is not a socket address
    /// - A timeout or the body limit is zero
    /// - The log level is not a valid filter directive
    /// - The metrics path is relative or collides with the route listing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("app.name", "must not be empty"));
        }

        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.logging.enabled {
            trellis_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        if self.metrics.enabled {
            if !self.metrics.path.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "metrics.path",
                    format!("must start with '/': {}", self.metrics.path),
                ));
            }
            if self.routing.expose_route_list && self.metrics.path == ROUTE_LIST_PATH {
                return Err(ConfigError::validation_error(format!(
                    "metrics.path must not be {ROUTE_LIST_PATH} while routing.expose_route_list is set"
                )));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors at debug level
    /// - Error details in 500 responses
    /// - Route listing at `/_routes` and 405 responses enabled
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_config::TrellisConfig;
    ///
    /// let config = TrellisConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.app.debug);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.app.environment = "development".to_string();
        config.app.debug = true;

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.routing.expose_route_list = true;
        config.routing.method_not_allowed = true;

        config.server.http_addr = "127.0.0.1:8080".to_string();

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Generic 500 responses
    /// - Prometheus metrics enabled
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.app.environment = "production".to_string();
        config.app.debug = false;

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.routing.expose_route_list = false;
        config.metrics.enabled = true;

        config
    }

    /// Kernel switches derived from the `routing` and `app` sections.
    #[must_use]
    pub fn kernel_options(&self) -> KernelOptions {
        KernelOptions {
            method_not_allowed: self.routing.method_not_allowed,
            expose_route_list: self.routing.expose_route_list,
            debug: self.app.debug,
        }
    }

    /// Subscriber settings derived from the `logging` section.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            ansi: self.logging.ansi_enabled,
            span_events: false,
            file_line_info: self.logging.include_location,
            include_target: true,
        }
    }

    /// Telemetry settings derived from the `logging` and `metrics` sections.
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: self.log_config(),
            metrics: trellis_telemetry::MetricsConfig {
                enabled: self.metrics.enabled,
                path: self.metrics.path.clone(),
            },
        }
    }
}

/// Builder for [`TrellisConfig`].
#[derive(Debug, Default)]
pub struct TrellisConfigBuilder {
    app: Option<AppConfig>,
    routing: Option<RoutingConfig>,
    server: Option<ServerConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
}

impl TrellisConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application section.
    #[must_use]
    pub fn app(mut self, app: AppConfig) -> Self {
        self.app = Some(app);
        self
    }

    /// Set the routing section.
    #[must_use]
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics section.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> TrellisConfig {
        TrellisConfig {
            app: self.app.unwrap_or_default(),
            routing: self.routing.unwrap_or_default(),
            server: self.server.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<TrellisConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrellisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.app.controller_namespace, "app::controllers");
        assert_eq!(config.kernel_options(), KernelOptions::default());
    }

    #[test]
    fn test_presets() {
        let dev = TrellisConfig::development();
        assert!(dev.validate().is_ok());
        assert!(dev.kernel_options().debug);
        assert!(dev.kernel_options().expose_route_list);
        assert_eq!(dev.log_config().format, LogFormat::Pretty);

        let prod = TrellisConfig::production();
        assert!(prod.validate().is_ok());
        assert!(!prod.kernel_options().debug);
        assert!(prod.telemetry_config().metrics.enabled);
    }

    #[test]
    fn test_builder_routing() {
        let config = TrellisConfig::builder()
            .routing(RoutingConfig {
                method_not_allowed: true,
                ..RoutingConfig::default()
            })
            .build();

        assert!(config.kernel_options().method_not_allowed);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_invalid_addr() {
        let result = TrellisConfig::builder()
            .server(ServerConfig {
                http_addr: "not-an-address".to_string(),
                ..ServerConfig::default()
            })
            .build_validated();
        assert!(matches!(result, Err(ConfigError::InvalidValue { field, .. }) if field == "server.http_addr"));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = TrellisConfig::default();
        config.server.max_body_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = TrellisConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metrics_path_validation() {
        let mut config = TrellisConfig::default();
        config.metrics.enabled = true;
        config.metrics.path = "metrics".to_string();
        assert!(config.validate().is_err());

        config.metrics.path = ROUTE_LIST_PATH.to_string();
        config.routing.expose_route_list = true;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_log_config_mapping() {
        let mut config = TrellisConfig::default();
        config.logging.include_location = true;
        config.logging.level = "trellis_core=debug,info".to_string();

        let log = config.log_config();
        assert!(log.file_line_info);
        assert_eq!(log.level, "trellis_core=debug,info");
        assert_eq!(log.format, LogFormat::Json);
    }
}
