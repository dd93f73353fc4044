//! The request handed to actions.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::de::DeserializeOwned;
use trellis_router::Params;

use crate::context::{MatchedRoute, RequestId};
use crate::error::HttpError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// An incoming HTTP request, buffered.
///
/// Route parameters and the matched route are attached by the
/// [`Kernel`](crate::Kernel) before the action runs.
///
/// # Example
///
/// ```
/// use trellis_core::Request;
///
/// let request = Request::get("/search?q=rust+lang&page=2");
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.query("q").as_deref(), Some("rust lang"));
/// assert_eq!(request.query("page").as_deref(), Some("2"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    request_id: RequestId,
    params: Params,
    route: Option<MatchedRoute>,
}

impl Request {
    /// Creates a request for `uri`, which may carry a query string.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (uri, None),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            request_id: RequestId::new(),
            params: Params::new(),
            route: None,
        }
    }

    /// A `GET` request.
    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// A `POST` request.
    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// A `PUT` request.
    #[must_use]
    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// A `PATCH` request.
    #[must_use]
    pub fn patch(uri: &str) -> Self {
        Self::new(Method::PATCH, uri)
    }

    /// A `DELETE` request.
    #[must_use]
    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Adds a header, keeping existing values for the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replaces the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path, without query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the first decoded value of a query parameter.
    ///
    /// `+` decodes to a space. Values that are not valid percent-encoded
    /// UTF-8 are skipped.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        self.query
            .as_deref()?
            .split('&')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                let key = decode_component(key)?;
                (key == name).then(|| decode_component(value)).flatten()
            })
            .next()
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the route parameters, in template order.
    ///
    /// Values are percent-decoded. Constraints are checked against the raw
    /// path, so `{name}` matching `John%20Doe` yields `John Doe`. A value
    /// that does not decode to UTF-8 is kept as it appeared in the path.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a route parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the route that matched this request, once dispatched.
    #[must_use]
    pub fn route(&self) -> Option<&MatchedRoute> {
        self.route.as_ref()
    }

    /// Returns `true` if the client wants a JSON response. See
    /// [`wants_json`].
    #[must_use]
    pub fn expects_json(&self) -> bool {
        wants_json(&self.headers)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`HttpError`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::bad_request(format!("Invalid JSON body: {e}")))
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params
            .iter()
            .map(|(name, value)| (name, decode_segment(value)))
            .collect();
    }

    pub(crate) fn set_route(&mut self, route: MatchedRoute) {
        self.route = Some(route);
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
            request_id,
            params: Params::new(),
            route: None,
        }
    }
}

/// Returns `true` if the `Accept` header mentions `json`, or the request was
/// made by `XMLHttpRequest`.
#[must_use]
pub fn wants_json(headers: &HeaderMap) -> bool {
    let accepts_json = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains("json"));
    accepts_json
        || headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_splits_query_string() {
        let request = Request::get("/users?sort=name");
        assert_eq!(request.path(), "/users");
        assert_eq!(request.query_string(), Some("sort=name"));

        let bare = Request::get("/users");
        assert_eq!(bare.query_string(), None);
        assert_eq!(bare.query("sort"), None);
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let mut request = Request::get("/greet/John%20Doe");
        let params: Params = [("name", "John%20Doe"), ("raw", "%FF%FE")].into_iter().collect();
        request.set_params(params);

        assert_eq!(request.param("name"), Some("John Doe"));
        assert_eq!(request.param("raw"), Some("%FF%FE"));
        assert_eq!(request.params().values().collect::<Vec<_>>(), vec!["John Doe", "%FF%FE"]);
    }

    #[test]
    fn test_query_decoding() {
        let request = Request::get("/s?name=J%C3%BCrgen&tag=a+b&flag&tag=c");
        assert_eq!(request.query("name").as_deref(), Some("Jürgen"));
        assert_eq!(request.query("tag").as_deref(), Some("a b"));
        assert_eq!(request.query("flag").as_deref(), Some(""));
        assert_eq!(request.query("missing"), None);
    }

    #[test]
    fn test_expects_json_from_accept() {
        let request = Request::get("/")
            .with_header(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(request.expects_json());

        let html = Request::get("/")
            .with_header(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!html.expects_json());
        assert!(!Request::get("/").expects_json());
    }

    #[test]
    fn test_expects_json_from_xhr() {
        let request = Request::get("/").with_header(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        assert!(request.expects_json());
    }

    #[test]
    fn test_json_body() {
        #[derive(Debug, Deserialize)]
        struct NewUser {
            name: String,
        }

        let request = Request::post("/users").with_body(r#"{"name":"Ada"}"#);
        let user: NewUser = request.json().unwrap();
        assert_eq!(user.name, "Ada");

        let broken = Request::post("/users").with_body("{");
        let err = broken.json::<NewUser>().unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_from_http_request_keeps_request_id() {
        let id = RequestId::new();
        let http_request = http::Request::builder()
            .method(Method::POST)
            .uri("/users/5?x=1")
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(Bytes::from_static(b"hi"))
            .unwrap();

        let request = Request::from(http_request);
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/users/5");
        assert_eq!(request.query("x").as_deref(), Some("1"));
        assert_eq!(request.request_id(), id);
        assert_eq!(request.body().as_ref(), b"hi");
    }

    #[test]
    fn test_from_http_request_ignores_bad_request_id() {
        let http_request = http::Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "nope")
            .body(Bytes::new())
            .unwrap();
        let request = Request::from(http_request);
        assert_eq!(request.request_id().as_uuid().get_version_num(), 7);
    }
}
