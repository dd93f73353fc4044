//! The HTTP server.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use trellis_config::ServerConfig;
use trellis_core::{wants_json, Kernel, Request, Response};

use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

type HttpResponse = http::Response<Full<Bytes>>;

/// Serves a [`Kernel`] over HTTP/1.1.
///
/// Request bodies are buffered up to `max_body_bytes`; larger bodies get
/// `413`. Actions run on the blocking pool and are cut off with `504` after
/// `request_timeout_ms`.
#[derive(Debug)]
pub struct Server {
    kernel: Arc<Kernel>,
    addr: SocketAddr,
    shutdown_timeout: Duration,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl Server {
    /// Creates a server for `kernel` with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if `http_addr` is not a socket
    /// address.
    pub fn new(kernel: impl Into<Arc<Kernel>>, config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = config
            .http_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
                addr: config.http_addr.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            kernel: kernel.into(),
            addr,
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Returns the kernel requests are dispatched to.
    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Returns the configured bind address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the request body limit in bytes.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Runs until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.to_string(),
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Accepts connections on `listener` until `shutdown` fires, then waits
    /// up to the shutdown timeout for open connections to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, routes = self.kernel.routes().len(), "Server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let guard = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(error) = server.serve_connection(stream, shutdown).await {
                                tracing::debug!(%remote_addr, %error, "Connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(error) => tracing::error!(%error, "Failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        tracing::info!(
            open_connections = tracker.active_connections(),
            timeout_secs = server.shutdown_timeout.as_secs(),
            "Draining connections"
        );

        if tokio::time::timeout(server.shutdown_timeout, tracker.drained())
            .await
            .is_err()
        {
            tracing::warn!(
                open_connections = tracker.active_connections(),
                "Shutdown timeout reached"
            );
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&self);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_request(&self, request: http::Request<Incoming>) -> HttpResponse {
        let expects_json = wants_json(request.headers());

        if declared_length(request.headers()).is_some_and(|len| len > self.max_body_bytes) {
            tracing::warn!(limit = self.max_body_bytes, "Request body too large");
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, expects_json);
        }

        let (parts, body) = request.into_parts();
        let collected = tokio::time::timeout(
            self.request_timeout,
            Limited::new(body, self.max_body_bytes).collect(),
        )
        .await;

        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(error)) if error.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::warn!(limit = self.max_body_bytes, "Request body too large");
                return error_response(StatusCode::PAYLOAD_TOO_LARGE, expects_json);
            }
            Ok(Err(error)) => {
                tracing::warn!(%error, "Failed to read request body");
                return error_response(StatusCode::BAD_REQUEST, expects_json);
            }
            Err(_) => {
                tracing::warn!("Timed out reading request body");
                return error_response(StatusCode::REQUEST_TIMEOUT, expects_json);
            }
        };

        let request = Request::from(http::Request::from_parts(parts, body));
        let kernel = Arc::clone(&self.kernel);
        let handled = tokio::time::timeout(
            self.request_timeout,
            tokio::task::spawn_blocking(move || kernel.handle(request)),
        )
        .await;

        let response = match handled {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                tracing::error!(%error, "Request task failed");
                Response::for_status(StatusCode::INTERNAL_SERVER_ERROR, expects_json)
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.request_timeout.as_millis(), "Request timed out");
                Response::for_status(StatusCode::GATEWAY_TIMEOUT, expects_json)
            }
        };

        response.into_http().map(Full::new)
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn error_response(status: StatusCode, expects_json: bool) -> HttpResponse {
    Response::for_status(status, expects_json)
        .into_http()
        .map(Full::new)
}
