//! The route registry.
//!
//! [`RouteRegistry`] owns every declared [`Route`] in an arena and indexes
//! them by HTTP method (registration order is match priority) and by name
//! (for reverse URL generation). Routes are declared through the
//! [`DeclareRoutes`] trait, implemented both by the registry itself and by
//! the [`RouteScope`] handed to group callbacks.

use std::fmt;

use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::{RouteError, RouteResult};
use crate::group::{GroupAttributes, GroupBuilder, GroupContext};
use crate::method::MethodSet;
use crate::params::Params;
use crate::route::Route;
use crate::template::normalize_path;

/// Identifies a route inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(usize);

impl RouteId {
    /// Returns the registration index of the route.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A successful lookup: the route that matched and its parameters.
#[derive(Debug)]
pub struct RouteMatch<'r, A> {
    id: RouteId,
    route: &'r Route<A>,
    params: Params,
}

impl<'r, A> RouteMatch<'r, A> {
    /// Returns the matched route's id.
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Returns the matched route.
    #[must_use]
    pub fn route(&self) -> &'r Route<A> {
        self.route
    }

    /// Returns the extracted parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Consumes the match and returns the parameters.
    #[must_use]
    pub fn into_params(self) -> Params {
        self.params
    }
}

/// A serializable description of one route, for listings and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    /// HTTP methods, in declaration order.
    pub methods: Vec<String>,
    /// The normalized URI template.
    pub uri: String,
    /// The route name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Attached middleware identifiers.
    pub middleware: Vec<String>,
    /// Parameter constraints.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub constraints: IndexMap<String, String>,
    /// Display form of the action.
    pub action: String,
}

/// Route declaration, shared by the registry and group scopes.
///
/// Only [`declare`](Self::declare) and [`group`](Self::group) need
/// implementing; the verb helpers and group builders are provided.
///
/// # Example
///
/// ```rust
/// use trellis_router::{DeclareRoutes, GroupAttributes, RouteRegistry};
/// use http::Method;
///
/// let mut router: RouteRegistry<&str> = RouteRegistry::new();
/// router.group(GroupAttributes::new().prefix("api"), |api| {
///     api.group(GroupAttributes::new().prefix("v1"), |v1| {
///         v1.get("/users", "users.index").map(drop)
///     })
/// }).unwrap();
///
/// assert!(router.find(&Method::GET, "/api/v1/users").is_some());
/// assert!(router.find(&Method::GET, "/users").is_none());
/// ```
pub trait DeclareRoutes {
    /// The action type stored on routes.
    type Action;

    /// Declares a route answering `methods` at `uri`, relative to the
    /// current group context.
    fn declare(
        &mut self,
        methods: MethodSet,
        uri: &str,
        action: Self::Action,
    ) -> RouteResult<RouteHandle<'_, Self::Action>>;

    /// Runs `declare` with a context derived from this one.
    fn group<F, R>(&mut self, attributes: GroupAttributes, declare: F) -> R
    where
        F: FnOnce(&mut RouteScope<'_, Self::Action>) -> R;

    /// Declares a `GET` route. `HEAD` requests also match it.
    fn get(
        &mut self,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>> {
        self.declare(MethodSet::get(), uri, action.into())
    }

    /// Declares a `POST` route.
    fn post(
        &mut self,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>> {
        self.declare(MethodSet::single(Method::POST), uri, action.into())
    }

    /// Declares a `PUT` route.
    fn put(
        &mut self,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>> {
        self.declare(MethodSet::single(Method::PUT), uri, action.into())
    }

    /// Declares a `PATCH` route.
    fn patch(
        &mut self,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>> {
        self.declare(MethodSet::single(Method::PATCH), uri, action.into())
    }

    /// Declares a `DELETE` route.
    fn delete(
        &mut self,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>> {
        self.declare(MethodSet::single(Method::DELETE), uri, action.into())
    }

    /// Declares an `OPTIONS` route.
    fn options(
        &mut self,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>> {
        self.declare(MethodSet::single(Method::OPTIONS), uri, action.into())
    }

    /// Declares a route answering every verb in [`ANY_METHODS`](crate::ANY_METHODS).
    fn any(
        &mut self,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>> {
        self.declare(MethodSet::any(), uri, action.into())
    }

    /// Declares a route answering the named verbs.
    fn match_methods<I, S>(
        &mut self,
        methods: I,
        uri: &str,
        action: impl Into<Self::Action>,
    ) -> RouteResult<RouteHandle<'_, Self::Action>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let methods = MethodSet::parse(methods)?;
        self.declare(methods, uri, action.into())
    }

    /// Starts a group with a URI prefix.
    fn prefix(&mut self, prefix: impl AsRef<str>) -> GroupBuilder<'_, Self> {
        GroupBuilder::new(self, GroupAttributes::new().prefix(prefix))
    }

    /// Starts a group with middleware.
    fn middleware<I, S>(&mut self, middleware: I) -> GroupBuilder<'_, Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupBuilder::new(self, GroupAttributes::new().middleware(middleware))
    }

    /// Starts a group with a route name prefix.
    fn name(&mut self, prefix: impl AsRef<str>) -> GroupBuilder<'_, Self> {
        GroupBuilder::new(self, GroupAttributes::new().name(prefix))
    }
}

/// Declaration scope handed to a group callback.
pub struct RouteScope<'r, A> {
    registry: &'r mut RouteRegistry<A>,
    context: GroupContext,
}

impl<A> RouteScope<'_, A> {
    /// Returns the context routes declared here inherit.
    #[must_use]
    pub fn context(&self) -> &GroupContext {
        &self.context
    }
}

impl<A> DeclareRoutes for RouteScope<'_, A> {
    type Action = A;

    fn declare(&mut self, methods: MethodSet, uri: &str, action: A) -> RouteResult<RouteHandle<'_, A>> {
        self.registry.declare_in(&self.context, methods, uri, action)
    }

    fn group<F, R>(&mut self, attributes: GroupAttributes, declare: F) -> R
    where
        F: FnOnce(&mut RouteScope<'_, A>) -> R,
    {
        let mut child = RouteScope {
            registry: &mut *self.registry,
            context: self.context.nest(&attributes),
        };
        declare(&mut child)
    }
}

/// A freshly declared route, open for further configuration.
///
/// Constraint methods recompile the route immediately and report malformed
/// fragments as declaration errors.
pub struct RouteHandle<'r, A> {
    registry: &'r mut RouteRegistry<A>,
    id: RouteId,
    name_prefix: String,
}

impl<A> RouteHandle<'_, A> {
    /// Returns the id of the declared route.
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Returns the declared route.
    #[must_use]
    pub fn route(&self) -> &Route<A> {
        &self.registry.routes[self.id.0]
    }

    /// Names the route. Enclosing group name prefixes are prepended.
    ///
    /// If another route already uses the name, this route replaces it in the
    /// name index.
    pub fn name(self, name: impl AsRef<str>) -> Self {
        let full = format!("{}{}", self.name_prefix, name.as_ref());
        self.registry.assign_name(self.id, full);
        self
    }

    /// Appends middleware after any inherited from groups.
    pub fn middleware<I, S>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_mut().push_middleware(middleware);
        self
    }

    /// See [`Route::where_pattern`].
    pub fn where_pattern(
        mut self,
        name: impl Into<String>,
        fragment: impl Into<String>,
    ) -> RouteResult<Self> {
        self.route_mut().where_pattern(name, fragment)?;
        Ok(self)
    }

    /// See [`Route::where_patterns`].
    pub fn where_patterns<I, K, V>(mut self, constraints: I) -> RouteResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.route_mut().where_patterns(constraints)?;
        Ok(self)
    }

    /// See [`Route::where_number`].
    pub fn where_number<I, S>(mut self, names: I) -> RouteResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_mut().where_number(names)?;
        Ok(self)
    }

    /// See [`Route::where_alpha`].
    pub fn where_alpha<I, S>(mut self, names: I) -> RouteResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_mut().where_alpha(names)?;
        Ok(self)
    }

    /// See [`Route::where_alpha_numeric`].
    pub fn where_alpha_numeric<I, S>(mut self, names: I) -> RouteResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_mut().where_alpha_numeric(names)?;
        Ok(self)
    }

    /// See [`Route::where_uuid`].
    pub fn where_uuid<I, S>(mut self, names: I) -> RouteResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_mut().where_uuid(names)?;
        Ok(self)
    }

    /// See [`Route::where_in`].
    pub fn where_in<I, S>(mut self, name: impl Into<String>, values: I) -> RouteResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.route_mut().where_in(name, values)?;
        Ok(self)
    }

    fn route_mut(&mut self) -> &mut Route<A> {
        &mut self.registry.routes[self.id.0]
    }
}

impl<A> fmt::Debug for RouteHandle<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandle")
            .field("id", &self.id)
            .field("route", self.route())
            .finish()
    }
}

/// Table of declared routes.
///
/// The registry is mutated only while routes are declared. Lookups take
/// `&self`, so a fully declared registry can be shared across threads.
///
/// # Example
///
/// ```rust
/// use trellis_router::{DeclareRoutes, RouteRegistry};
/// use http::Method;
///
/// let mut router: RouteRegistry<&str> = RouteRegistry::new();
/// router.get("/users/{id}", "users.show").unwrap()
///     .name("users.show")
///     .where_number(["id"]).unwrap();
///
/// let found = router.find(&Method::GET, "/users/42").unwrap();
/// assert_eq!(*found.route().action(), "users.show");
/// assert_eq!(found.params().get("id"), Some("42"));
///
/// assert_eq!(router.url("users.show", [("id", 5)]).unwrap(), "/users/5");
/// ```
pub struct RouteRegistry<A> {
    routes: Vec<Route<A>>,
    by_method: IndexMap<Method, Vec<RouteId>>,
    by_name: IndexMap<String, RouteId>,
}

impl<A> RouteRegistry<A> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            by_method: IndexMap::new(),
            by_name: IndexMap::new(),
        }
    }

    /// Returns the number of declared routes. A route answering several
    /// methods counts once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finds the first route declared for `method` that matches `path`.
    ///
    /// Routes are tried in registration order. Routes declared for other
    /// methods are never considered.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, A>> {
        let path = normalize_path(path);
        self.by_method.get(method)?.iter().find_map(|&id| {
            let route = &self.routes[id.0];
            route
                .capture_normalized(&path)
                .map(|params| RouteMatch { id, route, params })
        })
    }

    /// Collects the methods of every route matching `path`, whatever the
    /// request method. Empty when the path is unknown.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> MethodSet {
        let path = normalize_path(path);
        let mut allowed = MethodSet::new();
        for route in self.routes.iter().filter(|r| r.capture_normalized(&path).is_some()) {
            for method in route.methods().iter() {
                allowed.insert(method.clone());
            }
        }
        allowed
    }

    /// Generates the path of a named route.
    ///
    /// Supplied values are substituted literally, without percent-encoding.
    /// Optional parameters without a value are dropped together with their
    /// leading `/`. Values for names the template does not use are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::RouteNotFound`] for unknown names and
    /// [`RouteError::MissingRouteParameter`] when a required parameter has
    /// no value.
    pub fn url<I, K, V>(&self, name: &str, params: I) -> RouteResult<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let route = self
            .named(name)
            .ok_or_else(|| RouteError::route_not_found(name))?;
        let values: IndexMap<String, String> = params
            .into_iter()
            .map(|(key, value)| (key.as_ref().to_string(), value.to_string()))
            .collect();

        route
            .template()
            .render(|param| values.get(param).cloned())
            .map_err(|missing| RouteError::missing_parameters(name, missing))
    }

    /// Returns a route by id.
    #[must_use]
    pub fn route(&self, id: RouteId) -> Option<&Route<A>> {
        self.routes.get(id.0)
    }

    /// Returns the route currently registered under `name`.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Route<A>> {
        self.by_name.get(name).map(|id| &self.routes[id.0])
    }

    /// Returns `true` if a route is registered under `name`.
    #[must_use]
    pub fn has_named(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates every route once, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (RouteId, &Route<A>)> {
        self.routes.iter().enumerate().map(|(i, r)| (RouteId(i), r))
    }

    /// Returns routes grouped by method, each list in match priority order.
    #[must_use]
    pub fn routes(&self) -> IndexMap<&Method, Vec<&Route<A>>> {
        self.by_method
            .iter()
            .map(|(method, ids)| (method, ids.iter().map(|id| &self.routes[id.0]).collect()))
            .collect()
    }

    /// Returns the name index.
    #[must_use]
    pub fn named_routes(&self) -> IndexMap<&str, &Route<A>> {
        self.by_name
            .iter()
            .map(|(name, id)| (name.as_str(), &self.routes[id.0]))
            .collect()
    }

    /// Removes every route and name.
    pub fn clear(&mut self) {
        self.routes.clear();
        self.by_method.clear();
        self.by_name.clear();
    }

    pub(crate) fn declare_in(
        &mut self,
        context: &GroupContext,
        methods: MethodSet,
        uri: &str,
        action: A,
    ) -> RouteResult<RouteHandle<'_, A>> {
        if methods.is_empty() {
            return Err(RouteError::EmptyMethodSet);
        }

        let mut route = Route::new(methods, &context.uri(uri), action)?;
        route.push_middleware(context.middleware().iter().cloned());

        let id = RouteId(self.routes.len());
        for method in route.methods().iter() {
            self.by_method.entry(method.clone()).or_default().push(id);
        }
        debug!(
            methods = %route.methods(),
            uri = route.uri(),
            group_depth = context.depth(),
            "Route registered"
        );
        self.routes.push(route);

        Ok(RouteHandle {
            registry: self,
            id,
            name_prefix: context.name_prefix().to_string(),
        })
    }

    fn assign_name(&mut self, id: RouteId, name: String) {
        if let Some(previous) = self.routes[id.0].set_name(name.clone()) {
            if self.by_name.get(&previous) == Some(&id) {
                self.by_name.shift_remove(&previous);
            }
        }
        if let Some(replaced) = self.by_name.insert(name.clone(), id) {
            if replaced != id {
                debug!(name = %name, "Route name reassigned to a later route");
            }
        }
    }
}

impl<A: fmt::Display> RouteRegistry<A> {
    /// Describes every route in registration order.
    #[must_use]
    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes
            .iter()
            .map(|route| RouteSummary {
                methods: route.methods().iter().map(|m| m.as_str().to_string()).collect(),
                uri: route.uri().to_string(),
                name: route.name().map(str::to_string),
                middleware: route.middleware().to_vec(),
                constraints: route.constraints().clone(),
                action: route.action().to_string(),
            })
            .collect()
    }
}

impl<A> DeclareRoutes for RouteRegistry<A> {
    type Action = A;

    fn declare(&mut self, methods: MethodSet, uri: &str, action: A) -> RouteResult<RouteHandle<'_, A>> {
        self.declare_in(&GroupContext::root(), methods, uri, action)
    }

    fn group<F, R>(&mut self, attributes: GroupAttributes, declare: F) -> R
    where
        F: FnOnce(&mut RouteScope<'_, A>) -> R,
    {
        let mut scope = RouteScope {
            context: GroupContext::root().nest(&attributes),
            registry: self,
        };
        declare(&mut scope)
    }
}

impl<A> Default for RouteRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for RouteRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.routes)
            .field("named", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}
