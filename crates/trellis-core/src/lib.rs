//! # Trellis Core
//!
//! Requests, responses, actions and the dispatch kernel for Trellis.
//!
//! - [`Request`] / [`Response`] - buffered HTTP messages
//! - [`IntoResponse`] - normalization of action return values
//! - [`Action`] - closures and `"Controller@method"` references
//! - [`ControllerRegistry`] - explicit controller factories and method tables
//! - [`Kernel`] - matches requests and invokes actions
//! - [`DispatchError`] / [`HttpError`] - error types

#![doc(html_root_url = "https://docs.rs/trellis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod context;
pub mod controller;
mod error;
mod kernel;
mod request;
mod response;

pub use action::{Action, Closure};
pub use context::{MatchedRoute, RequestId};
pub use controller::{ControllerBuilder, ControllerMethod, ControllerRegistry, DEFAULT_NAMESPACE};
pub use error::{DispatchError, DispatchResult, ErrorCategory, ErrorDetail, ErrorEnvelope, HttpError};
pub use kernel::{Kernel, KernelOptions, RedirectRoutes, ROUTE_LIST_PATH};
pub use request::{wants_json, Request};
pub use response::{IntoResponse, Json, Response};
