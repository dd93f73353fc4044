//! The dispatch kernel.
//!
//! A [`Kernel`] owns the declared routes and the controller registry. It is
//! immutable once built, so one instance can serve every request from any
//! thread behind an `Arc`.
//!
//! ```text
//!   Request ──► find(method, path) ──► MatchedRoute + Params on Request
//!                    │                        │
//!                    │ no match               ▼
//!                    ▼                  invoke(action) ──► IntoResponse
//!     route list / 405 / fallback / 404
//! ```

use std::time::Instant;

use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use trellis_router::{
    normalize_path, DeclareRoutes, MethodSet, RouteHandle, RouteRegistry, RouteResult,
};
use trellis_telemetry::metrics::{record_request, record_route_miss, InFlightGuard, UNMATCHED_ROUTE};

use crate::action::Action;
use crate::context::MatchedRoute;
use crate::controller::ControllerRegistry;
use crate::error::DispatchResult;
use crate::request::Request;
use crate::response::Response;

/// Path answering with the JSON route listing when
/// [`KernelOptions::expose_route_list`] is set.
pub const ROUTE_LIST_PATH: &str = "/_routes";

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Behavior switches for the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelOptions {
    /// Answer 405 with an `Allow` header when the path is declared under
    /// other methods only. Otherwise such requests get a 404.
    pub method_not_allowed: bool,
    /// Serve the route listing at [`ROUTE_LIST_PATH`].
    pub expose_route_list: bool,
    /// Include error details in 500 responses.
    pub debug: bool,
}

/// Matches requests against routes and runs their actions.
///
/// # Example
///
/// ```
/// use trellis_core::{Action, ControllerRegistry, Kernel, Request};
/// use trellis_router::{DeclareRoutes, RouteRegistry};
///
/// let mut routes: RouteRegistry<Action> = RouteRegistry::new();
/// routes
///     .get("/greet/{name}", Action::closure(|_req, params| format!("Hello, {}!", params[0])))
///     .unwrap();
///
/// let kernel = Kernel::new(routes, ControllerRegistry::new());
/// let response = kernel.handle(Request::get("/greet/John"));
/// assert_eq!(response.body_text(), "Hello, John!");
///
/// let missing = kernel.handle(Request::get("/nope"));
/// assert_eq!(missing.status().as_u16(), 404);
/// assert_eq!(missing.body_text(), "404 Not Found");
/// ```
#[derive(Debug)]
pub struct Kernel {
    routes: RouteRegistry<Action>,
    controllers: ControllerRegistry,
    options: KernelOptions,
    fallback: Option<Action>,
}

impl Kernel {
    /// Creates a kernel with default options.
    #[must_use]
    pub fn new(routes: RouteRegistry<Action>, controllers: ControllerRegistry) -> Self {
        Self {
            routes,
            controllers,
            options: KernelOptions::default(),
            fallback: None,
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: KernelOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs an action run instead of the default 404 when no route
    /// matches.
    #[must_use]
    pub fn with_fallback(mut self, action: impl Into<Action>) -> Self {
        self.fallback = Some(action.into());
        self
    }

    /// Returns the route registry.
    #[must_use]
    pub fn routes(&self) -> &RouteRegistry<Action> {
        &self.routes
    }

    /// Returns the controller registry.
    #[must_use]
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> KernelOptions {
        self.options
    }

    /// Generates the path of a named route.
    pub fn url<I, K, V>(&self, name: &str, params: I) -> RouteResult<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        self.routes.url(name, params)
    }

    /// Dispatches a request.
    ///
    /// The first route declared for the request method whose pattern
    /// matches wins. Its snapshot and parameters are stored on `request`
    /// before the action runs. Unmatched requests get the route listing,
    /// a 405, the fallback or a 404, in that order of preference.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`](crate::DispatchError) if the action is a
    /// malformed reference or names an unknown controller or method.
    pub fn dispatch(&self, request: &mut Request) -> DispatchResult<Response> {
        let Some(found) = self.routes.find(request.method(), request.path()) else {
            return self.unmatched(request);
        };

        let route = found.route();
        tracing::debug!(route = route.uri(), name = route.name(), "Route matched");
        request.set_route(MatchedRoute::new(found.id(), route));
        request.set_params(found.into_params());

        let params: Vec<&str> = request.params().values().collect();
        self.invoke(route.action(), request, &params)
    }

    /// Dispatches a request and always produces a response.
    ///
    /// Dispatch errors are rendered as 500s, `HEAD` responses lose their
    /// body, and every response carries the request id in `X-Request-Id`.
    /// Each request is logged and counted.
    pub fn handle(&self, mut request: Request) -> Response {
        let _in_flight = InFlightGuard::new();
        let start = Instant::now();
        let request_id = request.request_id().to_string();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            http.method = %request.method(),
            http.path = request.path(),
        );
        let _enter = span.enter();

        let mut response = match self.dispatch(&mut request) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, code = e.error_code(), "Dispatch failed");
                e.render(request.expects_json(), Some(&request_id), self.options.debug)
            }
        };

        if request.method() == Method::HEAD {
            response.clear_body();
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().entry(REQUEST_ID_HEADER).or_insert(value);
        }

        let route = request.route().map_or(UNMATCHED_ROUTE, MatchedRoute::label);
        let status = response.status();
        let elapsed = start.elapsed();
        record_request(request.method().as_str(), route, status.as_u16(), elapsed);

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            tracing::warn!(http.status_code = status.as_u16(), route, duration_ms, "Request failed");
        } else {
            tracing::info!(http.status_code = status.as_u16(), route, duration_ms, "Request completed");
        }
        response
    }

    fn unmatched(&self, request: &Request) -> DispatchResult<Response> {
        if self.options.expose_route_list
            && (request.method() == Method::GET || request.method() == Method::HEAD)
            && normalize_path(request.path()) == ROUTE_LIST_PATH
        {
            return Ok(Response::json(&self.routes.summaries()));
        }

        if self.options.method_not_allowed {
            let allowed = self.routes.allowed_methods(request.path());
            if !allowed.is_empty() {
                tracing::debug!(allow = %allowed, "Path matched under other methods");
                return Ok(Response::method_not_allowed(&allowed, request.expects_json()));
            }
        }

        record_route_miss(request.method().as_str());
        if let Some(fallback) = &self.fallback {
            return self.invoke(fallback, request, &[]);
        }
        Ok(Response::not_found(request.expects_json()))
    }

    fn invoke(&self, action: &Action, request: &Request, params: &[&str]) -> DispatchResult<Response> {
        match action {
            Action::Closure(closure) => Ok(closure.call(request, params)),
            Action::Reference(reference) => {
                let (controller, method) = Action::parse_reference(reference)?;
                let handler = self.controllers.resolve(controller, method)?;
                Ok(handler(request, params))
            }
            Action::Handler { controller, method } => {
                let handler = self.controllers.resolve(controller, method)?;
                Ok(handler(request, params))
            }
        }
    }
}

/// Redirect routes, available wherever routes of [`Action`]s are declared.
///
/// ```
/// use trellis_core::{Action, RedirectRoutes};
/// use trellis_router::RouteRegistry;
/// use http::Method;
///
/// let mut routes: RouteRegistry<Action> = RouteRegistry::new();
/// routes.redirect("/home", "/").unwrap();
/// assert!(routes.find(&Method::GET, "/home").is_some());
/// ```
pub trait RedirectRoutes: DeclareRoutes<Action = Action> {
    /// Declares a `GET` route answering 302 with `Location: to`.
    fn redirect(&mut self, from: &str, to: &str) -> RouteResult<RouteHandle<'_, Action>> {
        self.redirect_with_status(from, to, StatusCode::FOUND)
    }

    /// Declares a `GET` route answering 301 with `Location: to`.
    fn permanent_redirect(&mut self, from: &str, to: &str) -> RouteResult<RouteHandle<'_, Action>> {
        self.redirect_with_status(from, to, StatusCode::MOVED_PERMANENTLY)
    }

    /// Declares a `GET` route answering `status` with `Location: to`.
    fn redirect_with_status(
        &mut self,
        from: &str,
        to: &str,
        status: StatusCode,
    ) -> RouteResult<RouteHandle<'_, Action>> {
        self.declare(MethodSet::get(), from, Action::redirect(to, status))
    }
}

impl<T: DeclareRoutes<Action = Action>> RedirectRoutes for T {}
