//! A single compiled route.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;

use crate::constraint;
use crate::error::RouteResult;
use crate::method::MethodSet;
use crate::params::Params;
use crate::template::{self, normalize_path, Template};

/// A declared endpoint: methods, template, constraints and metadata.
///
/// The compiled pattern is derived from the template and the constraint
/// map; every constraint change recompiles it before returning, so
/// [`matches`](Route::matches) never sees a stale pattern.
///
/// `A` is the action the route resolves to. The router never inspects it.
///
/// # Example
///
/// ```rust
/// use trellis_router::{MethodSet, Route};
///
/// let mut route = Route::new(MethodSet::get(), "/users/{id}", "users.show").unwrap();
/// assert!(route.matches("/users/abc"));
///
/// route.where_number(["id"]).unwrap();
/// assert!(route.matches("/users/123"));
/// assert!(!route.matches("/users/abc"));
/// ```
#[derive(Clone)]
pub struct Route<A> {
    methods: MethodSet,
    template: Template,
    parameter_names: Vec<String>,
    constraints: IndexMap<String, String>,
    pattern: Regex,
    name: Option<String>,
    middleware: Vec<String>,
    action: A,
}

impl<A> Route<A> {
    /// Creates a route, normalizing the template and compiling its pattern
    /// with no constraints.
    ///
    /// # Errors
    ///
    /// Fails if the template is malformed or repeats a parameter name.
    pub fn new(methods: MethodSet, uri: &str, action: A) -> RouteResult<Self> {
        let template = Template::parse(uri)?;
        let constraints = IndexMap::new();
        let pattern = template.compile(&constraints)?;
        let parameter_names = template.parameter_names().map(str::to_string).collect();

        Ok(Self {
            methods,
            template,
            parameter_names,
            constraints,
            pattern,
            name: None,
            middleware: Vec::new(),
            action,
        })
    }

    /// Returns the HTTP methods this route answers.
    #[must_use]
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// Returns the normalized URI template.
    #[must_use]
    pub fn uri(&self) -> &str {
        self.template.as_str()
    }

    /// Returns the parsed template.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Returns parameter names in template order.
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Returns `true` if the template declares this parameter.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter_names.iter().any(|n| n == name)
    }

    /// Returns the constraint map.
    #[must_use]
    pub fn constraints(&self) -> &IndexMap<String, String> {
        &self.constraints
    }

    /// Returns the anchored pattern currently used for matching.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the route name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if the route has a name.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Returns the middleware identifiers attached to this route.
    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Restricts one parameter to a regex fragment and recompiles.
    ///
    /// A constraint for a name the template does not declare is stored but
    /// has no effect on matching.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`](crate::RouteError::InvalidPattern)
    /// if the fragment does not compile, or
    /// [`RouteError::CapturingFragment`](crate::RouteError::CapturingFragment)
    /// if it contains capture groups. The previous constraint set is kept
    /// in either case.
    pub fn where_pattern(
        &mut self,
        name: impl Into<String>,
        fragment: impl Into<String>,
    ) -> RouteResult<&mut Self> {
        self.where_patterns([(name.into(), fragment.into())])
    }

    /// Merges several constraints and recompiles once.
    ///
    /// # Errors
    ///
    /// See [`where_pattern`](Route::where_pattern).
    pub fn where_patterns<I, K, V>(&mut self, constraints: I) -> RouteResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = self.constraints.clone();
        for (name, fragment) in constraints {
            merged.insert(name.into(), fragment.into());
        }
        self.pattern = self.template.compile(&merged)?;
        self.constraints = merged;
        Ok(self)
    }

    /// Restricts the named parameters to digits.
    ///
    /// # Errors
    ///
    /// See [`where_pattern`](Route::where_pattern).
    pub fn where_number<I, S>(&mut self, names: I) -> RouteResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.where_all(names, constraint::NUMBER)
    }

    /// Restricts the named parameters to ASCII letters.
    ///
    /// # Errors
    ///
    /// See [`where_pattern`](Route::where_pattern).
    pub fn where_alpha<I, S>(&mut self, names: I) -> RouteResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.where_all(names, constraint::ALPHA)
    }

    /// Restricts the named parameters to ASCII letters and digits.
    ///
    /// # Errors
    ///
    /// See [`where_pattern`](Route::where_pattern).
    pub fn where_alpha_numeric<I, S>(&mut self, names: I) -> RouteResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.where_all(names, constraint::ALPHA_NUMERIC)
    }

    /// Restricts the named parameters to canonical UUIDs.
    ///
    /// # Errors
    ///
    /// See [`where_pattern`](Route::where_pattern).
    pub fn where_uuid<I, S>(&mut self, names: I) -> RouteResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.where_all(names, constraint::UUID)
    }

    /// Restricts a parameter to one of a fixed set of values.
    ///
    /// # Errors
    ///
    /// See [`where_pattern`](Route::where_pattern).
    pub fn where_in<I, S>(&mut self, name: impl Into<String>, values: I) -> RouteResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.where_pattern(name, constraint::one_of(values))
    }

    /// Tests whether a request path matches this route.
    ///
    /// The path is normalized the same way as templates. Only whole-path
    /// matches are accepted.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(&normalize_path(path))
    }

    /// Extracts parameters from a matching path.
    ///
    /// Returns `None` when the path does not match. Optional parameters
    /// absent from the path are omitted from the result.
    #[must_use]
    pub fn extract_parameters(&self, path: &str) -> Option<Params> {
        template::capture(&self.pattern, &self.parameter_names, &normalize_path(path))
    }

    pub(crate) fn capture_normalized(&self, path: &str) -> Option<Params> {
        template::capture(&self.pattern, &self.parameter_names, path)
    }

    pub(crate) fn set_name(&mut self, name: String) -> Option<String> {
        self.name.replace(name)
    }

    pub(crate) fn push_middleware<I, S>(&mut self, middleware: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(middleware.into_iter().map(Into::into));
    }

    fn where_all<I, S>(&mut self, names: I, fragment: &str) -> RouteResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.where_patterns(names.into_iter().map(|name| (name.into(), fragment)))
    }
}

impl<A> fmt::Debug for Route<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods.to_string())
            .field("uri", &self.uri())
            .field("name", &self.name)
            .field("constraints", &self.constraints)
            .field("middleware", &self.middleware)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;

    fn route(uri: &str) -> Route<()> {
        Route::new(MethodSet::get(), uri, ()).unwrap()
    }

    #[test]
    fn test_template_is_normalized() {
        assert_eq!(route("users/{id}/").uri(), "/users/{id}");
        assert_eq!(route("").uri(), "/");
        assert_eq!(route("/").uri(), "/");
    }

    #[test]
    fn test_required_parameter_matching() {
        let r = route("/users/{id}");
        assert!(r.matches("/users/123"));
        assert!(r.matches("/users/abc"));
        assert!(r.matches("/users/abc/"));
        assert!(!r.matches("/users"));
        assert!(!r.matches("/users/123/x"));
        assert!(!r.matches("/prefix/users/123"));
    }

    #[test]
    fn test_optional_parameter_matching() {
        let r = route("/users/{id?}");
        assert!(r.matches("/users"));
        assert!(r.matches("/users/123"));
        assert!(!r.matches("/users/123/x"));
    }

    #[test]
    fn test_extract_multiple_parameters() {
        let r = route("/users/{userId}/posts/{postId}");
        let params = r.extract_parameters("/users/10/posts/20").unwrap();
        assert_eq!(params.get("userId"), Some("10"));
        assert_eq!(params.get("postId"), Some("20"));
        assert_eq!(params.values().collect::<Vec<_>>(), vec!["10", "20"]);
    }

    #[test]
    fn test_extract_omits_absent_optional() {
        let r = route("/users/{id?}");
        let params = r.extract_parameters("/users").unwrap();
        assert!(params.is_empty());
        assert!(!params.contains("id"));

        let params = r.extract_parameters("/users/7").unwrap();
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn test_extract_without_parameters() {
        let r = route("/health");
        assert!(r.extract_parameters("/health").unwrap().is_empty());
        assert!(r.extract_parameters("/other").is_none());
    }

    #[test]
    fn test_where_number() {
        let mut r = route("/users/{id}");
        r.where_number(["id"]).unwrap();
        assert!(r.matches("/users/123"));
        assert!(!r.matches("/users/abc"));
    }

    #[test]
    fn test_where_after_match_recompiles() {
        let mut r = route("/posts/{slug}");
        assert!(r.matches("/posts/hello"));

        r.where_pattern("slug", "[a-z]{3}").unwrap();
        assert!(!r.matches("/posts/hello"));
        assert!(r.matches("/posts/abc"));
    }

    #[test]
    fn test_where_on_unknown_parameter_is_inert() {
        let mut r = route("/users/{id}");
        let before = r.pattern().to_string();
        r.where_number(["missing"]).unwrap();
        assert_eq!(r.pattern(), before);
        assert!(r.matches("/users/abc"));
        assert_eq!(r.constraints().get("missing").map(String::as_str), Some("[0-9]+"));
    }

    #[test]
    fn test_where_multiple_names() {
        let mut r = route("/{year}/{month}/{slug}");
        r.where_number(["year", "month"]).unwrap().where_alpha(["slug"]).unwrap();
        assert!(r.matches("/2024/05/hello"));
        assert!(!r.matches("/2024/may/hello"));
        assert!(!r.matches("/2024/05/hello1"));
    }

    #[test]
    fn test_where_alpha_numeric_and_uuid() {
        let mut r = route("/keys/{key}/owners/{owner}");
        r.where_alpha_numeric(["key"]).unwrap().where_uuid(["owner"]).unwrap();
        assert!(r.matches("/keys/abc123/owners/0190b7c4-3f5e-7a2b-9c1d-4e5f6a7b8c9d"));
        assert!(!r.matches("/keys/abc-123/owners/0190b7c4-3f5e-7a2b-9c1d-4e5f6a7b8c9d"));
        assert!(!r.matches("/keys/abc123/owners/42"));
    }

    #[test]
    fn test_where_in() {
        let mut r = route("/export.{format}");
        r.where_in("format", ["csv", "json"]).unwrap();
        assert!(r.matches("/export.csv"));
        assert!(!r.matches("/export.xml"));
    }

    #[test]
    fn test_invalid_fragment_keeps_previous_constraints() {
        let mut r = route("/users/{id}");
        r.where_number(["id"]).unwrap();
        assert!(r.where_pattern("id", "(unclosed").is_err());
        assert!(r.matches("/users/5"));
        assert!(!r.matches("/users/abc"));
        assert_eq!(r.constraints().get("id").map(String::as_str), Some("[0-9]+"));
    }

    #[test]
    fn test_capturing_fragment_is_rejected() {
        let mut r = route("/users/{id}");
        r.where_number(["id"]).unwrap();

        let named = r.where_pattern("id", "(?P<extra>[0-9]+)").unwrap_err();
        assert!(matches!(named, RouteError::CapturingFragment { ref parameter, .. } if parameter == "id"));
        assert!(matches!(
            r.where_pattern("id", "([0-9]+)"),
            Err(RouteError::CapturingFragment { .. })
        ));
        assert!(matches!(
            r.where_pattern("id", "[0-9]+)(x"),
            Err(RouteError::InvalidPattern { .. })
        ));

        let groups: Vec<_> = r.pattern.capture_names().flatten().collect();
        assert_eq!(groups, r.parameter_names());
        assert_eq!(r.constraints().get("id").map(String::as_str), Some("[0-9]+"));
        assert!(r.matches("/users/5"));
    }

    #[test]
    fn test_non_capturing_groups_are_allowed() {
        let mut r = route("/files/{name}");
        r.where_pattern("name", "(?:[a-z]+)\\.(?:txt|md)").unwrap();
        assert!(r.matches("/files/notes.md"));
        assert!(!r.matches("/files/notes.rs"));
    }

    #[test]
    fn test_optional_with_constraint() {
        let mut r = route("/archive/{year?}");
        r.where_number(["year"]).unwrap();
        assert!(r.matches("/archive"));
        assert!(r.matches("/archive/2023"));
        assert!(!r.matches("/archive/latest"));
    }

    #[test]
    fn test_parameter_names_match_capture_groups() {
        let r = route("/a/{x}/b/{y?}");
        let groups: Vec<_> = r.pattern.capture_names().flatten().collect();
        assert_eq!(groups, r.parameter_names());
        assert!(r.has_parameter("y"));
        assert!(!r.has_parameter("z"));
    }
}
