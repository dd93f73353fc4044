//! Route groups.
//!
//! A group applies a URI prefix, middleware and a name prefix to every route
//! declared inside its callback. Groups nest: each nested call derives a new
//! [`GroupContext`] from its parent, and the parent is never modified, so
//! leaving a callback early (including with an error) cannot leak a prefix
//! into later declarations.

use crate::registry::{DeclareRoutes, RouteScope};
use crate::template::join_paths;

/// Attributes a group applies to its routes.
///
/// Every attribute is optional. Attributes accumulate: calling
/// [`prefix`](Self::prefix) twice joins both prefixes, and middleware and
/// name prefixes are appended in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAttributes {
    prefix: Option<String>,
    middleware: Vec<String>,
    name: Option<String>,
}

impl GroupAttributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URI prefix.
    pub fn prefix(mut self, prefix: impl AsRef<str>) -> Self {
        let joined = match self.prefix.take() {
            Some(current) => join_paths([current.as_str(), prefix.as_ref()]),
            None => join_paths([prefix.as_ref()]),
        };
        self.prefix = Some(joined);
        self
    }

    /// Appends middleware identifiers.
    pub fn middleware<I, S>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(middleware.into_iter().map(Into::into));
        self
    }

    /// Appends a route name prefix, such as `"admin."`.
    pub fn name(mut self, prefix: impl AsRef<str>) -> Self {
        self.name
            .get_or_insert_with(String::new)
            .push_str(prefix.as_ref());
        self
    }

    /// Returns the URI prefix, if any.
    #[must_use]
    pub fn prefix_str(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the middleware identifiers.
    #[must_use]
    pub fn middleware_list(&self) -> &[String] {
        &self.middleware
    }

    /// Returns the name prefix, if any.
    #[must_use]
    pub fn name_prefix(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// The accumulated effect of every enclosing group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupContext {
    prefixes: Vec<String>,
    middleware: Vec<String>,
    name_prefix: String,
    depth: usize,
}

impl GroupContext {
    /// The context outside any group.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Derives the context for a group nested inside this one.
    #[must_use]
    pub fn nest(&self, attributes: &GroupAttributes) -> Self {
        let mut child = self.clone();
        if let Some(prefix) = attributes.prefix_str() {
            child.prefixes.push(prefix.to_string());
        }
        child
            .middleware
            .extend(attributes.middleware_list().iter().cloned());
        if let Some(name) = attributes.name_prefix() {
            child.name_prefix.push_str(name);
        }
        child.depth += 1;
        child
    }

    /// Applies the accumulated prefixes to a route template.
    #[must_use]
    pub fn uri(&self, uri: &str) -> String {
        join_paths(self.prefixes.iter().map(String::as_str).chain([uri]))
    }

    /// Returns the accumulated prefixes, outer to inner.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Returns the accumulated middleware, outer to inner.
    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    /// Returns the accumulated route name prefix.
    #[must_use]
    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    /// Returns the nesting depth; the root context is `0`.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Fluent builder returned by [`DeclareRoutes::prefix`],
/// [`DeclareRoutes::middleware`] and [`DeclareRoutes::name`].
///
/// ```rust
/// use trellis_router::{DeclareRoutes, Params, RouteRegistry};
///
/// let mut router: RouteRegistry<&str> = RouteRegistry::new();
/// router
///     .prefix("admin")
///     .middleware(["auth"])
///     .name("admin.")
///     .group(|admin| {
///         admin.get("/users", "admin.users")?.name("users");
///         Ok::<_, trellis_router::RouteError>(())
///     })
///     .unwrap();
///
/// assert_eq!(router.url("admin.users", &Params::new()).unwrap(), "/admin/users");
/// ```
#[must_use = "a group builder does nothing until `group` is called"]
pub struct GroupBuilder<'r, D: ?Sized> {
    target: &'r mut D,
    attributes: GroupAttributes,
}

impl<'r, D: ?Sized> GroupBuilder<'r, D> {
    /// Creates a builder that will declare its group on `target`.
    pub fn new(target: &'r mut D, attributes: GroupAttributes) -> Self {
        Self { target, attributes }
    }

    /// Adds a URI prefix.
    pub fn prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.attributes = self.attributes.prefix(prefix);
        self
    }

    /// Appends middleware identifiers.
    pub fn middleware<I, S>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = self.attributes.middleware(middleware);
        self
    }

    /// Appends a route name prefix.
    pub fn name(mut self, prefix: impl AsRef<str>) -> Self {
        self.attributes = self.attributes.name(prefix);
        self
    }

    /// Returns the accumulated attributes.
    #[must_use]
    pub fn attributes(&self) -> &GroupAttributes {
        &self.attributes
    }

    /// Runs `declare` inside a group with the accumulated attributes.
    pub fn group<F, R>(self, declare: F) -> R
    where
        D: DeclareRoutes,
        F: FnOnce(&mut RouteScope<'_, D::Action>) -> R,
    {
        self.target.group(self.attributes, declare)
    }
}
