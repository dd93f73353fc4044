//! Route actions.
//!
//! An [`Action`] is what a route runs once it matches. It is either an
//! inline closure or a reference to a controller method, resolved through
//! the [`ControllerRegistry`](crate::ControllerRegistry) at dispatch time.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::error::DispatchError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

type BoxedHandler = Arc<dyn Fn(&Request, &[&str]) -> Response + Send + Sync>;

/// An inline action.
#[derive(Clone)]
pub struct Closure {
    handler: BoxedHandler,
    label: &'static str,
}

impl Closure {
    /// Runs the closure.
    pub fn call(&self, request: &Request, params: &[&str]) -> Response {
        (self.handler)(request, params)
    }

    /// Returns the label shown in route listings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure").field("label", &self.label).finish_non_exhaustive()
    }
}

/// What a route runs when it matches.
///
/// # Example
///
/// ```
/// use trellis_core::Action;
///
/// let greet = Action::closure(|_req, params| format!("Hello, {}!", params[0]));
/// assert_eq!(greet.to_string(), "Closure");
///
/// let show: Action = "UserController@show".into();
/// assert_eq!(show.to_string(), "UserController@show");
///
/// let index: Action = ("PostController", "index").into();
/// assert_eq!(index.to_string(), "PostController@index");
/// ```
#[derive(Clone)]
pub enum Action {
    /// A closure receiving the request and the parameter values in template
    /// order.
    Closure(Closure),
    /// A `"Controller@method"` reference, validated at dispatch.
    Reference(String),
    /// A controller and method given separately.
    Handler {
        /// Controller name, bare or fully qualified.
        controller: String,
        /// Method name.
        method: String,
    },
}

impl Action {
    /// Wraps a closure. Its return value is normalized through
    /// [`IntoResponse`].
    pub fn closure<F, R>(handler: F) -> Self
    where
        F: Fn(&Request, &[&str]) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        Self::labeled("Closure", handler)
    }

    /// A controller method given as a pair.
    pub fn handler(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Handler {
            controller: controller.into(),
            method: method.into(),
        }
    }

    /// An action answering with a redirect to `to`.
    #[must_use]
    pub fn redirect(to: impl Into<String>, status: StatusCode) -> Self {
        let to = to.into();
        Self::labeled("Redirect", move |_: &Request, _: &[&str]| {
            Response::redirect(&to, status)
        })
    }

    /// Splits a `"Controller@method"` reference.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidAction`] unless the reference holds
    /// exactly one `@` with a non-empty name on each side.
    pub fn parse_reference(reference: &str) -> Result<(&str, &str), DispatchError> {
        let Some((controller, method)) = reference.split_once('@') else {
            return Err(DispatchError::invalid_action(
                reference,
                "expected the form Controller@method",
            ));
        };
        if method.contains('@') {
            return Err(DispatchError::invalid_action(reference, "more than one '@'"));
        }
        if controller.trim().is_empty() || method.trim().is_empty() {
            return Err(DispatchError::invalid_action(
                reference,
                "controller and method must not be empty",
            ));
        }
        Ok((controller.trim(), method.trim()))
    }

    fn labeled<F, R>(label: &'static str, handler: F) -> Self
    where
        F: Fn(&Request, &[&str]) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        Self::Closure(Closure {
            handler: Arc::new(move |request: &Request, params: &[&str]| {
                handler(request, params).into_response()
            }),
            label,
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(closure) => f.write_str(closure.label),
            Self::Reference(reference) => f.write_str(reference),
            Self::Handler { controller, method } => write!(f, "{controller}@{method}"),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(closure) => fmt::Debug::fmt(closure, f),
            Self::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
            Self::Handler { controller, method } => f
                .debug_struct("Handler")
                .field("controller", controller)
                .field("method", method)
                .finish(),
        }
    }
}

impl From<&str> for Action {
    fn from(reference: &str) -> Self {
        Self::Reference(reference.to_string())
    }
}

impl From<String> for Action {
    fn from(reference: String) -> Self {
        Self::Reference(reference)
    }
}

impl From<(&str, &str)> for Action {
    fn from((controller, method): (&str, &str)) -> Self {
        Self::handler(controller, method)
    }
}
