//! Routing error types.

use thiserror::Error;

/// Result type alias using [`RouteError`].
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors raised while declaring routes or generating URLs.
///
/// Declaration errors (templates, constraints, methods) surface during boot
/// and should be treated as fatal. URL generation errors surface to the
/// caller of [`RouteRegistry::url`](crate::RouteRegistry::url).
#[derive(Error, Debug)]
pub enum RouteError {
    /// No route is registered under the requested name.
    #[error("route not defined: {name}")]
    RouteNotFound {
        /// The requested route name.
        name: String,
    },

    /// URL generation was missing values for required parameters.
    #[error("missing required parameter(s) for route {route}: {}", parameters.join(", "))]
    MissingRouteParameter {
        /// The route name.
        route: String,
        /// Required parameters that had no value.
        parameters: Vec<String>,
    },

    /// The URI template could not be parsed.
    #[error("invalid route template {template:?}: {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// Why the template was rejected.
        reason: String,
    },

    /// The same parameter name appears more than once in a template.
    #[error("duplicate parameter {{{name}}} in route template {template:?}")]
    DuplicateParameter {
        /// The offending template.
        template: String,
        /// The repeated parameter name.
        name: String,
    },

    /// A constraint fragment did not compile into a valid pattern.
    #[error("invalid pattern for route {template:?}: {source}")]
    InvalidPattern {
        /// The template whose pattern failed to compile.
        template: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A constraint fragment declares its own capture groups.
    #[error("constraint for {{{parameter}}} in route {template:?} must not capture: {fragment:?}")]
    CapturingFragment {
        /// The template the constraint was applied to.
        template: String,
        /// The constrained parameter.
        parameter: String,
        /// The rejected fragment.
        fragment: String,
    },

    /// A method name is not a valid HTTP token.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A route was declared without any methods.
    #[error("a route must answer at least one HTTP method")]
    EmptyMethodSet,
}

impl RouteError {
    /// Creates a route not found error.
    #[must_use]
    pub fn route_not_found(name: impl Into<String>) -> Self {
        Self::RouteNotFound { name: name.into() }
    }

    /// Creates a missing parameter error.
    #[must_use]
    pub fn missing_parameters(route: impl Into<String>, parameters: Vec<String>) -> Self {
        Self::MissingRouteParameter {
            route: route.into(),
            parameters,
        }
    }

    /// Creates an invalid template error.
    #[must_use]
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors that can only happen while routes are declared.
    #[must_use]
    pub const fn is_declaration_error(&self) -> bool {
        !matches!(
            self,
            Self::RouteNotFound { .. } | Self::MissingRouteParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_display() {
        let err = RouteError::route_not_found("users.show");
        assert_eq!(err.to_string(), "route not defined: users.show");
        assert!(!err.is_declaration_error());
    }

    #[test]
    fn test_missing_parameters_display() {
        let err = RouteError::missing_parameters(
            "posts.show",
            vec!["user".to_string(), "post".to_string()],
        );
        assert!(err.to_string().contains("posts.show"));
        assert!(err.to_string().contains("user, post"));
    }

    #[test]
    fn test_duplicate_parameter_display() {
        let err = RouteError::DuplicateParameter {
            template: "/a/{id}/b/{id}".to_string(),
            name: "id".to_string(),
        };
        assert!(err.to_string().contains("{id}"));
        assert!(err.is_declaration_error());
    }

    #[test]
    fn test_capturing_fragment_display() {
        let err = RouteError::CapturingFragment {
            template: "/users/{id}".to_string(),
            parameter: "id".to_string(),
            fragment: "([0-9]+)".to_string(),
        };
        assert!(err.to_string().contains("{id}"));
        assert!(err.to_string().contains("must not capture"));
        assert!(err.is_declaration_error());
    }
}
