//! Request-scoped context types.

use std::fmt;

use serde::{Deserialize, Serialize};
use trellis_router::{Route, RouteId};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request ids sortable in logs.
///
/// ```
/// use trellis_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a request id, such as one received in an `X-Request-Id`
    /// header.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Snapshot of the route that matched a request.
///
/// Stored on the [`Request`](crate::Request) being dispatched, so concurrent
/// dispatches never share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    id: RouteId,
    uri: String,
    name: Option<String>,
    middleware: Vec<String>,
}

impl MatchedRoute {
    pub(crate) fn new<A>(id: RouteId, route: &Route<A>) -> Self {
        Self {
            id,
            uri: route.uri().to_string(),
            name: route.name().map(str::to_string),
            middleware: route.middleware().to_vec(),
        }
    }

    /// Returns the route id within the kernel's registry.
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Returns the URI template.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the route name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the middleware attached to the route.
    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    /// The name if present, otherwise the template. Used as a low
    /// cardinality label in logs and metrics.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uri)
    }
}
