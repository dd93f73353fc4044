//! Test client for in-memory dispatch.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Serialize;
use trellis_core::Kernel;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight to a [`Kernel`].
///
/// Each request goes through [`Kernel::handle`], so it sees the same 404,
/// 405, error rendering and request id handling as a served request.
#[derive(Debug, Clone)]
pub struct TestClient {
    kernel: Arc<Kernel>,
    default_headers: HeaderMap,
}

impl TestClient {
    /// Creates a client for `kernel`.
    pub fn new(kernel: impl Into<Arc<Kernel>>) -> Self {
        Self {
            kernel: kernel.into(),
            default_headers: HeaderMap::new(),
        }
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.append(name, value);
        self
    }

    /// Returns the kernel under test.
    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Starts a `GET` request.
    pub fn get(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, path)
    }

    /// Starts a `HEAD` request.
    pub fn head(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, path)
    }

    /// Starts a `POST` request.
    pub fn post(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, path)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, path)
    }

    /// Starts a `PATCH` request.
    pub fn patch(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, path)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, path)
    }

    /// Starts an `OPTIONS` request.
    pub fn options(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, path)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, path);
        for (name, value) in &self.default_headers {
            builder = builder.header_typed(name.clone(), value.clone());
        }
        TestClientRequest {
            client: self,
            builder,
        }
    }
}

/// A request bound to a [`TestClient`].
#[derive(Debug)]
#[must_use = "requests do nothing until sent"]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Adds a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets `Accept: application/json`.
    pub fn accept_json(mut self) -> Self {
        self.builder = self.builder.accept_json();
        self
    }

    /// Appends a query pair.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Replaces the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sends `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    #[track_caller]
    pub fn send(self) -> TestResponse {
        self.try_send()
            .unwrap_or_else(|e| panic!("invalid test request: {e}"))
    }

    /// Sends the request, reporting build errors.
    ///
    /// # Errors
    ///
    /// Returns the error recorded while building the request.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.kernel.handle(request).into())
    }
}
