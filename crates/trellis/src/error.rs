//! Application errors.

use thiserror::Error;
use trellis_config::ConfigError;
use trellis_router::RouteError;
use trellis_server::ServerError;
use trellis_telemetry::TelemetryError;

/// Errors raised while assembling or running an [`Application`](crate::Application).
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A route declaration failed.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The server failed to start.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Result type for application assembly.
pub type AppResult<T> = Result<T, AppError>;
