//! # Trellis
//!
//! A Laravel-style HTTP routing micro-framework.
//!
//! Routes are declared from URI templates such as `/users/{id}` or
//! `/posts/{slug?}`, grouped under shared prefixes, middleware and name
//! prefixes, constrained with regular expressions, and named for reverse
//! URL generation. Actions are closures or `"Controller@method"` references
//! resolved through an explicit [`ControllerRegistry`](prelude::ControllerRegistry).
//!
//! ## Example
//!
//! ```
//! use trellis::prelude::*;
//!
//! let app = Application::builder(TrellisConfig::default())
//!     .routes(|routes| {
//!         routes.get("/greet/{name}", Action::closure(|_req, params| {
//!             format!("Hello, {}!", params[0])
//!         }))?;
//!
//!         routes.prefix("api").name("api.").group(|api| {
//!             api.get("/users/{id}", "UserController@show")?
//!                 .name("users.show")
//!                 .where_number(["id"])?;
//!             Ok(())
//!         })
//!     })?
//!     .build()?;
//!
//! let response = app.handle(Request::get("/greet/John"));
//! assert_eq!(response.body_text(), "Hello, John!");
//! assert_eq!(app.url("api.users.show", [("id", 5)])?, "/api/users/5");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/trellis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;

pub use app::{Application, ApplicationBuilder, METRICS_ROUTE_NAME};
pub use error::{AppError, AppResult};

// Re-export the member crates
pub use trellis_config as config;
pub use trellis_core as core;
pub use trellis_router as router;
pub use trellis_server as server;
pub use trellis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{AppError, AppResult, Application, ApplicationBuilder};

    pub use trellis_config::{ConfigLoader, TrellisConfig};

    pub use trellis_core::{
        Action, ControllerRegistry, DispatchError, HttpError, IntoResponse, Json, Kernel,
        KernelOptions, RedirectRoutes, Request, Response,
    };

    pub use trellis_router::{DeclareRoutes, RouteError, RouteRegistry, RouteResult};

    pub use trellis_server::ShutdownSignal;

    pub use http::{Method, StatusCode};
}
