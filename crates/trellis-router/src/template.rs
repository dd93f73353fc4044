//! URI template parsing and compilation.
//!
//! A template is a normalized path made of literal text and parameter
//! tokens: `{name}` for a required parameter and `{name?}` for an optional
//! one. Templates compile into a fully anchored regular expression in which
//! every parameter becomes a named capture group.
//!
//! ```text
//! /users/{id}          =>  ^/users/(?P<id>[^/]+)$
//! /users/{id?}         =>  ^/users(?:/(?P<id>[^/]+))?$
//! /posts/{post}/{tab?} =>  ^/posts/(?P<post>[^/]+)(?:/(?P<tab>[^/]+))?$
//! ```

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{RouteError, RouteResult};
use crate::params::Params;

/// Fragment used for parameters without an explicit constraint.
pub const DEFAULT_FRAGMENT: &str = "[^/]+";

/// Normalizes a path or template: trims surrounding slashes and prefixes a
/// single `/`. The empty path normalizes to `/`.
///
/// ```rust
/// use trellis_router::normalize_path;
///
/// assert_eq!(normalize_path("users/"), "/users");
/// assert_eq!(normalize_path("//"), "/");
/// assert_eq!(normalize_path(""), "/");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push('/');
    normalized.push_str(trimmed);
    normalized
}

/// Joins path fragments with single slashes and normalizes the result.
///
/// Empty fragments are skipped, so joining a blank group prefix never
/// produces a double slash.
///
/// ```rust
/// use trellis_router::join_paths;
///
/// assert_eq!(join_paths(["/api/", "v1", "/users"]), "/api/v1/users");
/// assert_eq!(join_paths(["", "/"]), "/");
/// ```
#[must_use]
pub fn join_paths<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = parts
        .into_iter()
        .filter_map(|part| {
            let trimmed = part.as_ref().trim_matches('/').to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect::<Vec<_>>()
        .join("/");
    normalize_path(&joined)
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, matched verbatim.
    Literal(String),
    /// A parameter placeholder.
    Param {
        /// The parameter name.
        name: String,
        /// Whether the parameter may be omitted.
        optional: bool,
    },
}

/// A parsed, normalized URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<Token>,
}

impl Template {
    /// Parses and normalizes a template.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidTemplate`] for unbalanced braces or names
    /// that are not identifiers, and [`RouteError::DuplicateParameter`] when
    /// a name is used twice.
    pub fn parse(template: &str) -> RouteResult<Self> {
        let source = normalize_path(template);
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = source.as_str();

        while let Some(open) = rest.find(['{', '}']) {
            if rest.as_bytes()[open] == b'}' {
                return Err(RouteError::invalid_template(&source, "unmatched '}'"));
            }
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| RouteError::invalid_template(&source, "unclosed '{'"))?;
            let raw = &after[..close];
            let (name, optional) = match raw.strip_suffix('?') {
                Some(name) => (name, true),
                None => (raw, false),
            };
            if !is_identifier(name) {
                return Err(RouteError::invalid_template(
                    &source,
                    format!("parameter name {name:?} is not an identifier"),
                ));
            }
            if tokens
                .iter()
                .any(|t| matches!(t, Token::Param { name: n, .. } if n == name))
            {
                return Err(RouteError::DuplicateParameter {
                    template: source.clone(),
                    name: name.to_string(),
                });
            }
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Param {
                name: name.to_string(),
                optional,
            });
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self { source, tokens })
    }

    /// Returns the normalized template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the parsed tokens.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns parameter names in template order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Param { name, .. } => Some(name.as_str()),
            Token::Literal(_) => None,
        })
    }

    /// Builds the anchored regular expression for this template.
    ///
    /// Parameters without an entry in `constraints` use
    /// [`DEFAULT_FRAGMENT`]. A separator immediately preceding an optional
    /// parameter becomes part of the optional group, so the separator is
    /// not required when the parameter is absent.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if a constraint fragment is
    /// not a valid regular expression on its own, and
    /// [`RouteError::CapturingFragment`] if it declares capture groups.
    pub fn compile(&self, constraints: &IndexMap<String, String>) -> RouteResult<Regex> {
        let mut body = String::with_capacity(self.source.len() * 2);

        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Literal(text) => {
                    let text = match self.tokens.get(i + 1) {
                        Some(Token::Param { .. }) => text.strip_suffix('/').unwrap_or(text),
                        _ => text.as_str(),
                    };
                    body.push_str(&regex::escape(text));
                }
                Token::Param { name, optional } => {
                    let separator = match i.checked_sub(1).map(|p| &self.tokens[p]) {
                        Some(Token::Literal(prev)) if prev.ends_with('/') => "/",
                        _ => "",
                    };
                    let fragment = match constraints.get(name) {
                        Some(fragment) => {
                            self.check_fragment(name, fragment)?;
                            fragment.as_str()
                        }
                        None => DEFAULT_FRAGMENT,
                    };
                    if *optional {
                        body.push_str(&format!("(?:{separator}(?P<{name}>{fragment}))?"));
                    } else {
                        body.push_str(&format!("{separator}(?P<{name}>{fragment})"));
                    }
                }
            }
        }

        // A template such as `/{page?}` leaves nothing mandatory in front of
        // the optional group; the root path must still match.
        if !body.starts_with('/') {
            body.insert_str(0, "/?");
        }

        Regex::new(&format!("^{body}$")).map_err(|source| RouteError::InvalidPattern {
            template: self.source.clone(),
            source,
        })
    }

    // The only capture groups in a compiled pattern are the parameters.
    fn check_fragment(&self, name: &str, fragment: &str) -> RouteResult<()> {
        let compiled = Regex::new(fragment).map_err(|source| RouteError::InvalidPattern {
            template: self.source.clone(),
            source,
        })?;
        if compiled.captures_len() > 1 {
            return Err(RouteError::CapturingFragment {
                template: self.source.clone(),
                parameter: name.to_string(),
                fragment: fragment.to_string(),
            });
        }
        Ok(())
    }

    /// Substitutes parameter values into the template.
    ///
    /// Values are inserted literally. Optional parameters without a value are
    /// dropped together with their leading separator.
    ///
    /// # Errors
    ///
    /// Returns the names of required parameters that had no value.
    pub fn render<F>(&self, mut lookup: F) -> Result<String, Vec<String>>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.source.len());
        let mut missing = Vec::new();

        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Param { name, optional } => match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None if *optional => {
                        if out.ends_with('/') {
                            out.pop();
                        }
                    }
                    None => missing.push(name.clone()),
                },
            }
        }

        if !missing.is_empty() {
            return Err(missing);
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }
}

/// Runs an anchored match and collects named captures in template order.
pub(crate) fn capture(regex: &Regex, names: &[String], path: &str) -> Option<Params> {
    let captures = regex.captures(path)?;
    let mut params = Params::with_capacity(names.len());
    for name in names {
        if let Some(value) = captures.name(name) {
            params.push(name.as_str(), value.as_str());
        }
    }
    Some(params)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
