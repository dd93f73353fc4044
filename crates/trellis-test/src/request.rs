//! Test request building.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Serialize;
use trellis_core::Request;

use crate::error::TestError;

/// Builds a [`Request`] for tests.
///
/// Invalid headers and unserializable JSON bodies are reported by
/// [`build`](Self::build) instead of panicking at the call site.
///
/// # Example
///
/// ```
/// use trellis_test::TestRequestBuilder;
///
/// let request = TestRequestBuilder::get("/search")
///     .query("q", "rust lang")
///     .header("X-Trace", "abc")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.query_string(), Some("q=rust%20lang"));
/// assert_eq!(request.header("x-trace"), Some("abc"));
/// ```
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for `method` and `path`.
    ///
    /// `path` may already carry a query string; pairs added with
    /// [`query`](Self::query) are appended to it.
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        Self {
            method,
            path: path.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// A `GET` builder.
    pub fn get(path: impl AsRef<str>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `POST` builder.
    pub fn post(path: impl AsRef<str>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Adds a header, keeping earlier values for the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", name.as_ref())));
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", value.as_ref())));
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (Err(e), _) | (_, Err(e)) => self.fail(e),
        }
        self
    }

    /// Adds an already-validated header.
    pub fn header_typed(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets `Accept`.
    pub fn accept(self, accept: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT.as_str(), accept)
    }

    /// Sets `Accept: application/json`.
    pub fn accept_json(self) -> Self {
        self.accept("application/json")
    }

    /// Sets `Content-Type`.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Appends a percent-encoded query pair.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.query
            .push((name.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Replaces the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body and sets `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.content_type("application/json")
            }
            Err(e) => {
                self.fail(TestError::Json(e));
                self
            }
        }
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building, or
    /// [`TestError::RequestBuild`] if the path is not absolute.
    pub fn build(self) -> Result<Request, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !self.path.starts_with('/') {
            return Err(TestError::RequestBuild(format!(
                "path must start with '/': {}",
                self.path
            )));
        }

        let mut uri = self.path;
        if !self.query.is_empty() {
            let encoded = self
                .query
                .iter()
                .map(|(name, value)| {
                    format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&");
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&encoded);
        }

        let mut request = Request::new(self.method, &uri).with_body(self.body);
        for (name, value) in &self.headers {
            request = request.with_header(name.clone(), value.clone());
        }
        Ok(request)
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_is_encoded_and_appended() {
        let request = TestRequestBuilder::get("/s?page=2")
            .query("q", "a&b")
            .build()
            .unwrap();
        assert_eq!(request.query_string(), Some("page=2&q=a%26b"));
        assert_eq!(request.query("q").as_deref(), Some("a&b"));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = TestRequestBuilder::post("/users")
            .json(&json!({ "name": "Ada" }))
            .build()
            .unwrap();
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body().as_ref(), br#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_invalid_header_is_reported() {
        let result = TestRequestBuilder::get("/").header("bad header", "x").build();
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let result = TestRequestBuilder::get("users").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_accept_json() {
        let request = TestRequestBuilder::get("/").accept_json().build().unwrap();
        assert!(request.expects_json());
    }
}
