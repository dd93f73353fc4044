//! HTTP method sets.
//!
//! A route answers one or more HTTP verbs. [`MethodSet`] keeps them in
//! declaration order without duplicates.

use std::fmt;

use http::Method;
use smallvec::SmallVec;

use crate::error::RouteError;

/// The verbs registered by [`MethodSet::any`].
pub const ANY_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// An ordered, duplicate-free set of HTTP methods.
///
/// # Example
///
/// ```rust
/// use trellis_router::MethodSet;
/// use http::Method;
///
/// let methods = MethodSet::parse(["get", "post"]).unwrap();
/// assert!(methods.contains(&Method::GET));
/// assert!(!methods.contains(&Method::DELETE));
/// assert_eq!(methods.to_string(), "GET|POST");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    methods: SmallVec<[Method; 4]>,
}

impl MethodSet {
    /// Creates an empty method set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding a single method.
    #[must_use]
    pub fn single(method: Method) -> Self {
        let mut set = Self::new();
        set.insert(method);
        set
    }

    /// The set used for `GET` routes: `GET` and `HEAD`.
    #[must_use]
    pub fn get() -> Self {
        [Method::GET, Method::HEAD].into_iter().collect()
    }

    /// Every verb a catch-all route answers.
    #[must_use]
    pub fn any() -> Self {
        ANY_METHODS.into_iter().collect()
    }

    /// Parses method names, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidMethod`] for names that are not valid
    /// HTTP tokens, or [`RouteError::EmptyMethodSet`] if no names are given.
    pub fn parse<I, S>(names: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            let name = name.as_ref();
            let method = Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                .map_err(|_| RouteError::InvalidMethod(name.to_string()))?;
            set.insert(method);
        }
        if set.is_empty() {
            return Err(RouteError::EmptyMethodSet);
        }
        Ok(set)
    }

    /// Adds a method; duplicates are ignored.
    pub fn insert(&mut self, method: Method) {
        if !self.contains(&method) {
            self.methods.push(method);
        }
    }

    /// Returns `true` if the set contains the method.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.methods.iter().any(|m| m == method)
    }

    /// Returns the number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Iterates the methods in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    /// Renders the set as a comma separated `Allow` header value.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        let mut set = Self::new();
        for method in iter {
            set.insert(method);
        }
        set
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, method) in self.methods.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(method.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_includes_head() {
        let set = MethodSet::get();
        assert!(set.contains(&Method::GET));
        assert!(set.contains(&Method::HEAD));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_any() {
        let set = MethodSet::any();
        assert_eq!(set.len(), ANY_METHODS.len());
        assert!(set.contains(&Method::DELETE));
        assert!(!set.contains(&Method::TRACE));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let set = MethodSet::parse(["get", "Post", "PUT"]).unwrap();
        assert_eq!(set.to_string(), "GET|POST|PUT");
    }

    #[test]
    fn test_parse_dedupes() {
        let set = MethodSet::parse(["GET", "get"]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_parse_rejects_empty() {
        let names: [&str; 0] = [];
        assert!(matches!(
            MethodSet::parse(names),
            Err(RouteError::EmptyMethodSet)
        ));
    }

    #[test]
    fn test_parse_rejects_invalid_token() {
        assert!(matches!(
            MethodSet::parse(["GE T"]),
            Err(RouteError::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_allow_header() {
        let set: MethodSet = [Method::GET, Method::POST].into_iter().collect();
        assert_eq!(set.allow_header(), "GET, POST");
    }
}
