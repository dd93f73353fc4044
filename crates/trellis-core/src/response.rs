//! HTTP responses and return-value normalization.
//!
//! Actions may return anything implementing [`IntoResponse`]; the kernel
//! turns it into a [`Response`]:
//!
//! | Returned value | Response |
//! |---|---|
//! | [`Response`] | unchanged |
//! | `String`, `&str` | 200, `text/plain` |
//! | [`Json<T>`], `serde_json::Value` | 200, `application/json` |
//! | `(StatusCode, T)` | `T`'s response with the given status |
//! | `()` | 204, empty |
//! | `Result<T, E>` | whichever side is present |

use std::borrow::Cow;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::Serialize;
use trellis_router::MethodSet;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// An HTTP response: status, headers and a buffered body.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// 200 with a plain-text body.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))
            .with_body(body.into())
    }

    /// 200 with an HTML body.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML))
            .with_body(body.into())
    }

    /// 200 with a JSON body.
    ///
    /// A value that fails to serialize yields a 500 response instead.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(StatusCode::OK)
                .with_header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(APPLICATION_JSON),
                )
                .with_body(body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                Self::text("500 Server Error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// 204 with no body.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// A redirect to `location` with the given 3xx status.
    ///
    /// A location that is not a valid header value yields a 500 response.
    #[must_use]
    pub fn redirect(location: &str, status: StatusCode) -> Self {
        match HeaderValue::from_str(location) {
            Ok(value) => Self::new(status).with_header(header::LOCATION, value),
            Err(_) => {
                tracing::error!(location, "Redirect target is not a valid header value");
                Self::text("500 Server Error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// A bare error page for `status`.
    ///
    /// JSON-expecting requests get `{"error": reason}`, others get the text
    /// `"<code> <reason>"`.
    #[must_use]
    pub fn for_status(status: StatusCode, expects_json: bool) -> Self {
        let reason = status.canonical_reason().unwrap_or("Error");
        let response = if expects_json {
            Self::json(&serde_json::json!({ "error": reason }))
        } else {
            Self::text(format!("{} {reason}", status.as_u16()))
        };
        response.with_status(status)
    }

    /// The response for a request that matched no route.
    ///
    /// JSON-expecting requests get `{"error":"Not Found"}`, others get the
    /// text `404 Not Found`.
    #[must_use]
    pub fn not_found(expects_json: bool) -> Self {
        Self::for_status(StatusCode::NOT_FOUND, expects_json)
    }

    /// The response for a path that exists under other methods only.
    #[must_use]
    pub fn method_not_allowed(allowed: &MethodSet, expects_json: bool) -> Self {
        let response = Self::for_status(StatusCode::METHOD_NOT_ALLOWED, expects_json);
        match HeaderValue::from_str(&allowed.allow_header()) {
            Ok(value) => response.with_header(header::ALLOW, value),
            Err(_) => response,
        }
    }

    /// Replaces the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a header value if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Drops the body, keeping status and headers. Used for `HEAD`.
    pub fn clear_body(&mut self) {
        self.body = Bytes::new();
    }

    /// Converts into an `http::Response`.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl From<Response> for http::Response<Bytes> {
    fn from(response: Response) -> Self {
        response.into_http()
    }
}

/// Conversion of action return values into a [`Response`].
pub trait IntoResponse {
    /// Performs the conversion.
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for &str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for Cow<'_, str> {
    fn into_response(self) -> Response {
        Response::text(self.into_owned())
    }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> Response {
        Response::json(&self)
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        Response::no_content()
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::new(self)
    }
}

/// Applies the status to the inner response, unless the inner conversion
/// already failed with a server error.
impl<T: IntoResponse> IntoResponse for (StatusCode, T) {
    fn into_response(self) -> Response {
        let (status, inner) = self;
        let response = inner.into_response();
        if response.status().is_server_error() {
            response
        } else {
            response.with_status(status)
        }
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(value) => value.into_response(),
            Err(err) => err.into_response(),
        }
    }
}

/// Wraps a serializable value to be returned as JSON.
///
/// ```
/// use trellis_core::{IntoResponse, Json};
///
/// let response = Json(vec![1, 2, 3]).into_response();
/// assert_eq!(response.header("content-type"), Some("application/json"));
/// assert_eq!(response.body_text(), "[1,2,3]");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        Response::json(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_string_is_plain_text() {
        let response = "Hello, John!".into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body_text(), "Hello, John!");
        assert_eq!(response.header("content-type"), Some(TEXT_PLAIN));
    }

    #[test]
    fn test_json_value() {
        let response = serde_json::json!({ "id": 5 }).into_response();
        assert_eq!(response.header("content-type"), Some(APPLICATION_JSON));
        assert_eq!(response.body_text(), r#"{"id":5}"#);
    }

    #[test]
    fn test_status_tuple_overrides() {
        let response = (StatusCode::CREATED, Json(serde_json::json!({ "ok": true }))).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header("content-type"), Some(APPLICATION_JSON));
    }

    #[test]
    fn test_status_tuple_keeps_serialization_failure() {
        struct Unserializable;

        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cannot serialize"))
            }
        }

        let response = (StatusCode::OK, Json(Unserializable)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body_text(), "500 Server Error");
    }

    #[test]
    fn test_unit_is_no_content() {
        let response = ().into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_result_picks_side() {
        let ok: Result<&str, (StatusCode, &str)> = Ok("fine");
        assert_eq!(ok.into_response().status(), StatusCode::OK);

        let err: Result<&str, (StatusCode, &str)> = Err((StatusCode::CONFLICT, "taken"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.body_text(), "taken");
    }

    #[test]
    fn test_response_passes_through() {
        let original = Response::html("<h1>Hi</h1>").with_status(StatusCode::ACCEPTED);
        let response = original.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.header("content-type"), Some(TEXT_HTML));
    }

    #[test]
    fn test_not_found_bodies() {
        let text = Response::not_found(false);
        assert_eq!(text.status(), StatusCode::NOT_FOUND);
        assert_eq!(text.body_text(), "404 Not Found");

        let json = Response::not_found(true);
        assert_eq!(json.status(), StatusCode::NOT_FOUND);
        assert_eq!(json.body_text(), r#"{"error":"Not Found"}"#);
    }

    #[test]
    fn test_for_status() {
        let text = Response::for_status(StatusCode::PAYLOAD_TOO_LARGE, false);
        assert_eq!(text.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(text.body_text(), "413 Payload Too Large");

        let json = Response::for_status(StatusCode::GATEWAY_TIMEOUT, true);
        assert_eq!(json.body_text(), r#"{"error":"Gateway Timeout"}"#);
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let allowed: MethodSet = [Method::GET, Method::POST].into_iter().collect();
        let response = Response::method_not_allowed(&allowed, false);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.header("allow"), Some("GET, POST"));
    }

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/login", StatusCode::FOUND);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.header("location"), Some("/login"));

        let broken = Response::redirect("/bad\nheader", StatusCode::FOUND);
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_http() {
        let response = Response::text("hi").with_status(StatusCode::ACCEPTED).into_http();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body().as_ref(), b"hi");
    }
}
