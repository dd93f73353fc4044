//! # Trellis Server
//!
//! Serves a [`Kernel`](trellis_core::Kernel) over HTTP/1.1 with Hyper.
//!
//! - Buffered request bodies with a size limit
//! - Request timeouts
//! - Graceful shutdown on SIGINT/SIGTERM or a [`ShutdownSignal`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use trellis_config::ServerConfig;
//! use trellis_core::{ControllerRegistry, Kernel};
//! use trellis_router::RouteRegistry;
//! use trellis_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kernel = Kernel::new(RouteRegistry::new(), ControllerRegistry::new());
//!     Server::new(kernel, &ServerConfig::default())?.run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod server;
mod shutdown;

pub use error::ServerError;
pub use server::Server;
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
