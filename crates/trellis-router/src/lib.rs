//! Route declaration and matching for Trellis.
//!
//! This crate turns declarative path templates into anchored matchers,
//! extracts named parameters, applies per-parameter constraints, composes
//! nested route groups and generates URLs from route names.
//!
//! # Features
//!
//! - **Templates**: `{name}` required and `{name?}` optional parameters
//! - **Constraints**: `where_number`, `where_alpha`, `where_uuid`, `where_in`
//!   or any regex fragment, recompiled as soon as they change
//! - **Groups**: URI prefixes, middleware and name prefixes, nested freely
//! - **Reverse routing**: `url("users.show", [("id", 5)])` → `/users/5`
//! - **First match wins**: routes are tried in registration order
//!
//! # Example
//!
//! ```rust
//! use trellis_router::{DeclareRoutes, Params, RouteError, RouteRegistry};
//! use http::Method;
//!
//! let mut router: RouteRegistry<&str> = RouteRegistry::new();
//!
//! router.get("/", "home").unwrap().name("home");
//! router
//!     .prefix("api")
//!     .middleware(["api"])
//!     .group(|api| {
//!         api.get("/users/{id}", "users.show")?
//!             .name("users.show")
//!             .where_number(["id"])?;
//!         api.post("/users", "users.store")?;
//!         Ok::<_, RouteError>(())
//!     })
//!     .unwrap();
//!
//! let found = router.find(&Method::GET, "/api/users/42").unwrap();
//! assert_eq!(*found.route().action(), "users.show");
//! assert_eq!(found.params().get("id"), Some("42"));
//! assert_eq!(found.route().middleware(), ["api"]);
//!
//! assert!(router.find(&Method::GET, "/api/users/abc").is_none());
//! assert_eq!(router.url("users.show", [("id", 7)]).unwrap(), "/api/users/7");
//! assert_eq!(router.url("home", &Params::new()).unwrap(), "/");
//! ```
//!
//! # Matching
//!
//! Each route keeps a compiled pattern derived from its template and
//! constraints:
//!
//! ```text
//!   GET /users/{id}         ──► ^/users/(?P<id>[0-9]+)$        (where_number)
//!   GET /users/{id?}        ──► ^/users(?:/(?P<id>[^/]+))?$
//!
//!   by_method[GET] = [route 0, route 3, ...]   tried in order, first hit wins
//!   by_name["users.show"] = route 0            last assignment wins
//! ```

pub mod constraint;
mod error;
mod group;
mod method;
mod params;
mod registry;
mod route;
mod template;

pub use error::{RouteError, RouteResult};
pub use group::{GroupAttributes, GroupBuilder, GroupContext};
pub use method::{MethodSet, ANY_METHODS};
pub use params::Params;
pub use registry::{
    DeclareRoutes, RouteHandle, RouteId, RouteMatch, RouteRegistry, RouteScope, RouteSummary,
};
pub use route::Route;
pub use template::{join_paths, normalize_path, Template, Token, DEFAULT_FRAGMENT};

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9_-]{1,8}"
    }

    fn digits() -> impl Strategy<Value = String> {
        "[0-9]{1,6}"
    }

    #[test]
    fn test_greeting_route() {
        let mut router: RouteRegistry<&str> = RouteRegistry::new();
        router.get("/greet/{name}", "greet").unwrap();

        let found = router.find(&Method::GET, "/greet/John").unwrap();
        assert_eq!(found.params().values().collect::<Vec<_>>(), ["John"]);
    }

    #[test]
    fn test_root_route() {
        let mut router: RouteRegistry<&str> = RouteRegistry::new();
        router.get("/", "home").unwrap();
        assert!(router.find(&Method::GET, "/").is_some());
        assert!(router.find(&Method::GET, "").is_some());
        assert!(router.find(&Method::GET, "/x").is_none());
    }

    proptest! {
        #[test]
        fn required_params_match_same_segment_count(
            values in proptest::collection::vec(segment(), 1..5),
            extra in segment(),
        ) {
            let template = values
                .iter()
                .enumerate()
                .map(|(i, _)| format!("{{p{i}}}"))
                .collect::<Vec<_>>()
                .join("/");
            let route = Route::new(MethodSet::get(), &template, ()).unwrap();

            let path = format!("/{}", values.join("/"));
            prop_assert!(route.matches(&path));

            let params = route.extract_parameters(&path).unwrap();
            for (i, value) in values.iter().enumerate() {
                prop_assert_eq!(params.get(&format!("p{i}")), Some(value.as_str()));
            }

            let longer = format!("{path}/{extra}");
            prop_assert!(!route.matches(&longer));

            if values.len() > 1 {
                let shorter = format!("/{}", values[..values.len() - 1].join("/"));
                prop_assert!(!route.matches(&shorter));
            }
        }

        #[test]
        fn number_constraint_accepts_only_digits(value in segment()) {
            let mut route = Route::new(MethodSet::get(), "/users/{id}", ()).unwrap();
            route.where_number(["id"]).unwrap();
            let is_numeric = value.bytes().all(|b| b.is_ascii_digit());
            prop_assert_eq!(route.matches(&format!("/users/{value}")), is_numeric);
        }

        #[test]
        fn url_then_match_recovers_values(id in digits(), page in proptest::option::of(digits())) {
            let mut router: RouteRegistry<()> = RouteRegistry::new();
            router
                .get("/users/{id}/posts/{page?}", ())
                .unwrap()
                .name("posts")
                .where_number(["id", "page"])
                .unwrap();

            let mut params = vec![("id", id.clone())];
            if let Some(page) = &page {
                params.push(("page", page.clone()));
            }
            let url = router.url("posts", params).unwrap();
            let found = router.find(&Method::GET, &url).unwrap();

            prop_assert_eq!(found.params().get("id"), Some(id.as_str()));
            prop_assert_eq!(found.params().get("page"), page.as_deref());
        }
    }
}
