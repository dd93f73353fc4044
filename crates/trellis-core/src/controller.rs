//! Controller registration and action resolution.
//!
//! Routes may name their action as `"Controller@method"`. Such references are
//! resolved against a [`ControllerRegistry`], which maps fully qualified
//! controller names to a factory and a table of methods. A fresh controller
//! instance is built for every invocation.
//!
//! # Example
//!
//! ```
//! use trellis_core::{ControllerRegistry, Request};
//!
//! #[derive(Default)]
//! struct UserController;
//!
//! impl UserController {
//!     fn show(&self, _req: &Request, params: &[&str]) -> String {
//!         format!("user {}", params[0])
//!     }
//! }
//!
//! let mut controllers = ControllerRegistry::new();
//! controllers
//!     .controller::<UserController>("UserController")
//!     .method("show", UserController::show);
//!
//! let show = controllers.resolve("UserController", "show").unwrap();
//! let response = show(&Request::get("/users/7"), &["7"]);
//! assert_eq!(response.body_text(), "user 7");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Namespace applied to bare controller names.
pub const DEFAULT_NAMESPACE: &str = "app::controllers";

/// A resolved controller method, ready to invoke.
pub type ControllerMethod = Arc<dyn Fn(&Request, &[&str]) -> Response + Send + Sync>;

/// Registered controllers, keyed by fully qualified name.
pub struct ControllerRegistry {
    namespace: String,
    controllers: HashMap<String, HashMap<String, ControllerMethod>>,
}

impl ControllerRegistry {
    /// Creates an empty registry using [`DEFAULT_NAMESPACE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Creates an empty registry with a custom default namespace.
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            controllers: HashMap::new(),
        }
    }

    /// Returns the default namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Qualifies a controller name. Names already containing `::` are kept.
    #[must_use]
    pub fn qualify(&self, controller: &str) -> String {
        if controller.contains("::") || self.namespace.is_empty() {
            controller.to_string()
        } else {
            format!("{}::{controller}", self.namespace)
        }
    }

    /// Registers a controller built with `C::default()`.
    pub fn controller<C>(&mut self, name: &str) -> ControllerBuilder<'_, C>
    where
        C: Default + 'static,
    {
        self.controller_with(name, C::default)
    }

    /// Registers a controller built by `factory`.
    ///
    /// Registering the same name again adds to its method table; existing
    /// methods with the same name are replaced.
    pub fn controller_with<C, F>(&mut self, name: &str, factory: F) -> ControllerBuilder<'_, C>
    where
        C: 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let name = self.qualify(name);
        tracing::debug!(controller = %name, "Controller registered");
        ControllerBuilder {
            methods: self.controllers.entry(name).or_default(),
            factory: Arc::new(factory),
        }
    }

    /// Finds a controller method.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ActionResolution`] if the controller or the
    /// method is not registered.
    pub fn resolve(&self, controller: &str, method: &str) -> Result<&ControllerMethod, DispatchError> {
        let name = self.qualify(controller);
        let Some(methods) = self.controllers.get(&name) else {
            return Err(DispatchError::action_resolution(
                format!("{name}@{method}"),
                format!("controller {name} is not registered"),
            ));
        };
        methods.get(method).ok_or_else(|| {
            DispatchError::action_resolution(
                format!("{name}@{method}"),
                format!("method {method} does not exist on {name}"),
            )
        })
    }

    /// Returns `true` if the controller is registered.
    #[must_use]
    pub fn contains(&self, controller: &str) -> bool {
        self.controllers.contains_key(&self.qualify(controller))
    }

    /// Returns `true` if the controller defines `method`.
    #[must_use]
    pub fn has_method(&self, controller: &str, method: &str) -> bool {
        self.controllers
            .get(&self.qualify(controller))
            .is_some_and(|methods| methods.contains_key(method))
    }

    /// Returns the number of registered controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns `true` if no controllers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.controllers.keys().collect();
        names.sort();
        f.debug_struct("ControllerRegistry")
            .field("namespace", &self.namespace)
            .field("controllers", &names)
            .finish()
    }
}

/// Adds methods to a registered controller.
pub struct ControllerBuilder<'r, C> {
    methods: &'r mut HashMap<String, ControllerMethod>,
    factory: Arc<dyn Fn() -> C + Send + Sync>,
}

impl<C: 'static> ControllerBuilder<'_, C> {
    /// Registers `handler` as the method `name`.
    pub fn method<F, R>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&C, &Request, &[&str]) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        let factory = Arc::clone(&self.factory);
        let method: ControllerMethod = Arc::new(move |request: &Request, params: &[&str]| {
            let controller = factory();
            handler(&controller, request, params).into_response()
        });
        self.methods.insert(name.to_string(), method);
        self
    }
}

impl<C> fmt::Debug for ControllerBuilder<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBuilder")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use http::StatusCode;

    #[derive(Default)]
    struct PostController;

    impl PostController {
        fn index(&self, _req: &Request, _params: &[&str]) -> &'static str {
            "all posts"
        }

        fn show(&self, _req: &Request, params: &[&str]) -> String {
            format!("post {}", params[0])
        }
    }

    fn registry() -> ControllerRegistry {
        let mut controllers = ControllerRegistry::new();
        controllers
            .controller::<PostController>("PostController")
            .method("index", PostController::index)
            .method("show", PostController::show);
        controllers
    }

    #[test]
    fn test_qualify() {
        let controllers = ControllerRegistry::new();
        assert_eq!(controllers.qualify("UserController"), "app::controllers::UserController");
        assert_eq!(controllers.qualify("admin::UserController"), "admin::UserController");

        let bare = ControllerRegistry::with_namespace("");
        assert_eq!(bare.qualify("UserController"), "UserController");
    }

    #[test]
    fn test_resolve_bare_and_qualified() {
        let controllers = registry();
        let request = Request::get("/posts/3");

        let show = controllers.resolve("PostController", "show").unwrap();
        assert_eq!(show(&request, &["3"]).body_text(), "post 3");

        let index = controllers
            .resolve("app::controllers::PostController", "index")
            .unwrap();
        assert_eq!(index(&request, &[]).status(), StatusCode::OK);
    }

    #[test]
    fn test_resolve_errors() {
        let controllers = registry();

        let err = controllers.resolve("MissingController", "index").err().unwrap();
        assert!(matches!(err, DispatchError::ActionResolution { .. }));
        assert!(err.to_string().contains("app::controllers::MissingController"));

        let err = controllers.resolve("PostController", "destroy").err().unwrap();
        assert!(err.to_string().contains("destroy"));
    }

    #[test]
    fn test_factory_runs_per_call() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);

        struct Counted;

        let mut controllers = ControllerRegistry::new();
        controllers
            .controller_with("Counted", || {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Counted
            })
            .method("ping", |_: &Counted, _: &Request, _: &[&str]| "pong");

        let ping = controllers.resolve("Counted", "ping").unwrap();
        let request = Request::get("/");
        let _ = ping(&request, &[]);
        let _ = ping(&request, &[]);
        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_introspection() {
        let controllers = registry();
        assert_eq!(controllers.len(), 1);
        assert!(controllers.contains("PostController"));
        assert!(controllers.has_method("PostController", "show"));
        assert!(!controllers.has_method("PostController", "edit"));
    }
}
