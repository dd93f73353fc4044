//! # Trellis Test
//!
//! In-memory testing for Trellis applications. Requests go straight to a
//! [`Kernel`](trellis_core::Kernel), so no port is bound and no runtime is
//! needed.
//!
//! ## Example
//!
//! ```
//! use trellis_core::{Action, ControllerRegistry, Kernel};
//! use trellis_router::{DeclareRoutes, RouteRegistry};
//! use trellis_test::TestClient;
//!
//! let mut routes: RouteRegistry<Action> = RouteRegistry::new();
//! routes
//!     .get("/greet/{name}", Action::closure(|_req, params| format!("Hello, {}!", params[0])))
//!     .unwrap();
//!
//! let client = TestClient::new(Kernel::new(routes, ControllerRegistry::new()));
//!
//! client
//!     .get("/greet/John")
//!     .send()
//!     .assert_status_code(200)
//!     .assert_body_eq("Hello, John!");
//!
//! client
//!     .get("/nowhere")
//!     .accept_json()
//!     .send()
//!     .assert_status_code(404)
//!     .assert_json_eq(&serde_json::json!({ "error": "Not Found" }));
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
