//! Error types for Trellis.
//!
//! [`DispatchError`] covers failures of the kernel itself, such as an action
//! reference that cannot be resolved. [`HttpError`] is what handlers return
//! to abort a request with a specific status.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::{IntoResponse, Response};

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Categories of errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or invalid input.
    Validation,
    /// Missing or invalid credentials.
    Authentication,
    /// Permission denied.
    Authorization,
    /// Resource not found.
    NotFound,
    /// The path exists but not for this method.
    MethodNotAllowed,
    /// Request body over the configured limit.
    PayloadTooLarge,
    /// The request took too long.
    Timeout,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classifies an HTTP status code.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Authentication,
            StatusCode::FORBIDDEN => Self::Authorization,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::METHOD_NOT_ALLOWED => Self::MethodNotAllowed,
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            s if s.is_client_error() => Self::Validation,
            _ => Self::Internal,
        }
    }
}

/// Errors raised while dispatching a matched route.
///
/// These are fatal for the request being dispatched and are rendered as a
/// 500 response by [`Kernel::handle`](crate::Kernel::handle).
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The action reference is not of the form `Controller@method`.
    #[error("Invalid action {action:?}: {reason}")]
    InvalidAction {
        /// The offending reference.
        action: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The referenced controller or method is not registered.
    #[error("Unable to resolve action {action}: {reason}")]
    ActionResolution {
        /// The fully qualified `Controller@method` reference.
        action: String,
        /// What was missing.
        reason: String,
    },
}

impl DispatchError {
    /// Creates an invalid action error.
    #[must_use]
    pub fn invalid_action(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Creates an action resolution error.
    #[must_use]
    pub fn action_resolution(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionResolution {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory::Internal
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAction { .. } => "INVALID_ACTION",
            Self::ActionResolution { .. } => "ACTION_RESOLUTION_ERROR",
        }
    }

    /// Converts this error to a serializable envelope.
    ///
    /// With `debug` off the message is replaced by a generic one, so
    /// controller names never reach clients.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>, debug: bool) -> ErrorEnvelope {
        let message = if debug {
            self.to_string()
        } else {
            "Server Error".to_string()
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                category: self.category(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Renders the error as a JSON envelope or a plain-text body.
    #[must_use]
    pub fn render(&self, expects_json: bool, request_id: Option<&str>, debug: bool) -> Response {
        if expects_json {
            return Response::json(&self.to_envelope(request_id, debug))
                .with_status(self.status_code());
        }
        let body = if debug {
            format!("500 Server Error\n\n{self}")
        } else {
            "500 Server Error".to_string()
        };
        Response::text(body).with_status(self.status_code())
    }
}

/// An error a handler returns to abort with a given status.
///
/// Renders as `{"error": message}` with the status code.
///
/// ```
/// use trellis_core::{HttpError, IntoResponse};
/// use http::StatusCode;
///
/// let response = HttpError::not_found("No such user").into_response();
/// assert_eq!(response.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
#[error("{status}: {message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

impl HttpError {
    /// Creates an error with a status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error using the status' canonical reason as message.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Error"))
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 500 with an underlying cause. The cause is logged, never rendered.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_status(self.status)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if let Some(source) = &self.source {
            tracing::error!(error = %source, status = self.status.as_u16(), "{}", self.message);
        }
        Response::json(&serde_json::json!({ "error": self.message })).with_status(self.status)
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_status_codes() {
        assert_eq!(
            ErrorCategory::NotFound.default_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCategory::from_status(StatusCode::UNPROCESSABLE_ENTITY),
            ErrorCategory::Validation
        );
        assert_eq!(
            ErrorCategory::from_status(StatusCode::BAD_GATEWAY),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_dispatch_error_status() {
        let err = DispatchError::invalid_action("UserController", "missing '@'");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INVALID_ACTION");
        assert!(err.to_string().contains("UserController"));
    }

    #[test]
    fn test_envelope_hides_details_without_debug() {
        let err = DispatchError::action_resolution("app::controllers::Missing@index", "not registered");

        let hidden = err.to_envelope(Some("req-1"), false);
        assert_eq!(hidden.error.message, "Server Error");
        assert_eq!(hidden.request_id.as_deref(), Some("req-1"));

        let shown = err.to_envelope(None, true);
        assert!(shown.error.message.contains("Missing@index"));

        let json = serde_json::to_value(&shown).unwrap();
        assert_eq!(json["error"]["category"], "internal");
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn test_dispatch_error_render() {
        let err = DispatchError::invalid_action("nope", "missing '@'");

        let text = err.render(false, None, false);
        assert_eq!(text.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text.body_text(), "500 Server Error");

        let json = err.render(true, Some("abc"), true);
        let body: serde_json::Value = serde_json::from_slice(json.body()).unwrap();
        assert_eq!(body["error"]["code"], "INVALID_ACTION");
        assert_eq!(body["request_id"], "abc");
    }

    #[test]
    fn test_http_error_response() {
        let response = HttpError::forbidden("Nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], "Nope");
    }

    #[test]
    fn test_http_error_from_status() {
        let err = HttpError::from_status(StatusCode::CONFLICT);
        assert_eq!(err.message(), "Conflict");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.to_string(), "409 Conflict: Conflict");
    }

    #[test]
    fn test_http_error_source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = HttpError::internal_with_source("Could not save", io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
