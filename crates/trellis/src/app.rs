//! Application assembly.

use std::sync::Arc;

use http::StatusCode;
use trellis_config::TrellisConfig;
use trellis_core::{Action, ControllerRegistry, Kernel, Request, Response};
use trellis_router::{DeclareRoutes, RouteRegistry, RouteResult};
use trellis_server::{Server, ShutdownSignal};

use crate::error::AppResult;

/// Name of the route serving Prometheus metrics when `metrics.enabled` is set.
pub const METRICS_ROUTE_NAME: &str = "trellis.metrics";

/// Builds an [`Application`] from configuration, routes and controllers.
#[derive(Debug)]
#[must_use]
pub struct ApplicationBuilder {
    config: TrellisConfig,
    routes: RouteRegistry<Action>,
    controllers: ControllerRegistry,
    fallback: Option<Action>,
}

impl ApplicationBuilder {
    /// Starts an application. Bare controller names resolve under
    /// `app.controller_namespace`.
    pub fn new(config: TrellisConfig) -> Self {
        let controllers = ControllerRegistry::with_namespace(config.app.controller_namespace.clone());
        Self {
            config,
            routes: RouteRegistry::new(),
            controllers,
            fallback: None,
        }
    }

    /// Declares routes.
    ///
    /// # Errors
    ///
    /// Returns the first declaration error raised by `declare`.
    pub fn routes<F>(mut self, declare: F) -> AppResult<Self>
    where
        F: FnOnce(&mut RouteRegistry<Action>) -> RouteResult<()>,
    {
        declare(&mut self.routes)?;
        Ok(self)
    }

    /// Registers controllers.
    pub fn controllers<F>(mut self, register: F) -> Self
    where
        F: FnOnce(&mut ControllerRegistry),
    {
        register(&mut self.controllers);
        self
    }

    /// Sets the action run when no route matches.
    pub fn fallback(mut self, action: impl Into<Action>) -> Self {
        self.fallback = Some(action.into());
        self
    }

    /// Validates the configuration and assembles the kernel.
    ///
    /// With `metrics.enabled`, a `GET` route named [`METRICS_ROUTE_NAME`] is
    /// declared at `metrics.path` after the application's routes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`](crate::AppError::Config) if validation
    /// fails, or [`AppError::Route`](crate::AppError::Route) if the metrics
    /// route cannot be declared.
    pub fn build(self) -> AppResult<Application> {
        let Self {
            config,
            mut routes,
            controllers,
            fallback,
        } = self;

        config.validate()?;

        if config.metrics.enabled {
            routes
                .get(&config.metrics.path, metrics_action())?
                .name(METRICS_ROUTE_NAME);
        }

        let mut kernel = Kernel::new(routes, controllers).with_options(config.kernel_options());
        if let Some(fallback) = fallback {
            kernel = kernel.with_fallback(fallback);
        }

        tracing::info!(
            app = %config.app.name,
            environment = %config.app.environment,
            routes = kernel.routes().len(),
            controllers = kernel.controllers().len(),
            "Application assembled"
        );

        Ok(Application {
            config,
            kernel: Arc::new(kernel),
        })
    }
}

fn metrics_action() -> Action {
    Action::closure(|_req, _params| match trellis_telemetry::render_metrics() {
        Some(body) => Response::text(body),
        None => Response::for_status(StatusCode::SERVICE_UNAVAILABLE, false),
    })
}

/// A configured kernel, ready to handle requests or serve them over HTTP.
#[derive(Debug, Clone)]
pub struct Application {
    config: TrellisConfig,
    kernel: Arc<Kernel>,
}

impl Application {
    /// Starts building an application.
    pub fn builder(config: TrellisConfig) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    /// Returns the configuration the application was built with.
    #[must_use]
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Returns the shared kernel.
    #[must_use]
    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    /// Handles a request in-process.
    #[must_use]
    pub fn handle(&self, request: Request) -> Response {
        self.kernel.handle(request)
    }

    /// Generates the URL of a named route.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or a required parameter is
    /// missing.
    pub fn url<I, K, V>(&self, name: &str, params: I) -> RouteResult<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        self.kernel.url(name, params)
    }

    /// Installs the logging subscriber and, if enabled, the metrics
    /// recorder. Call once per process.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber or recorder is already set.
    pub fn init_telemetry(&self) -> AppResult<()> {
        trellis_telemetry::init_telemetry(&self.config.telemetry_config())?;
        Ok(())
    }

    /// Serves the application until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server address cannot be bound.
    pub async fn serve(self) -> AppResult<()> {
        let server = Server::new(self.kernel, &self.config.server)?;
        server.run().await?;
        Ok(())
    }

    /// Serves the application until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the server address cannot be bound.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> AppResult<()> {
        let server = Server::new(self.kernel, &self.config.server)?;
        server.run_with_shutdown(shutdown).await?;
        Ok(())
    }
}
