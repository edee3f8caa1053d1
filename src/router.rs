//! Route registry.
//!
//! Routes are kept in registration order in one flat list. Build the router
//! once at startup; once it is handed to [`Server::start`](crate::Server::start)
//! it sits behind an `Arc` and can no longer change.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, RoutingError};
use crate::handler::{BoxedHandler, Handler};
use crate::matcher::{self, Match, Pattern};
use crate::method::Method;
use crate::route::{ParamKind, PatternKind, Route};

/// A registered route: methods, compiled pattern, handler and parameters.
pub struct RouteEntry {
    methods: Vec<Method>,
    pub(crate) pattern: Pattern,
    pub(crate) handler: BoxedHandler,
    pub(crate) params: Vec<(Arc<str>, ParamKind)>,
}

impl RouteEntry {
    pub fn methods(&self) -> &[Method] { &self.methods }
    pub fn kind(&self) -> PatternKind { self.pattern.kind() }
    pub fn pattern(&self) -> &str { self.pattern.source() }

    /// Declared parameter names, in order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| &**name)
    }

    pub(crate) fn accepts(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("params", &self.params().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A group of routes declared together, usually by one handler object.
///
/// ```rust
/// use std::sync::Arc;
/// use tsuji::{Args, Error, Json, Route, Router, RouteSet};
///
/// struct Greeter { greeting: String }
///
/// impl RouteSet for Greeter {
///     fn register(self, router: Router) -> Result<Router, Error> {
///         let me = Arc::new(self);
///         router.route(Route::template("/hello/{name}").param("name"), move |args: Args| {
///             let me = Arc::clone(&me);
///             async move {
///                 let name = args.var("name").unwrap_or_default().to_owned();
///                 Json(format!("{} {name}", me.greeting))
///             }
///         })
///     }
/// }
/// ```
pub trait RouteSet {
    fn register(self, router: Router) -> Result<Router, Error>;
}

/// The application router.
///
/// Each [`Router::route`] call returns the router so registrations chain
/// with `?`.
#[derive(Default)]
pub struct Router {
    entries: Vec<RouteEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a route declaration.
    ///
    /// Fails when the pattern does not compile, or when an exact path is
    /// registered twice for the same method.
    ///
    /// ```rust
    /// # use tsuji::{Args, Json, Route, Router};
    /// # async fn get_user(_: Args) -> Json<()> { Json(()) }
    /// # async fn create_user(_: Args) -> Json<()> { Json(()) }
    /// # fn main() -> Result<(), tsuji::Error> {
    /// Router::new()
    ///     .route(Route::template("/users/{id}").param("id"), get_user)?
    ///     .route(Route::post("/users").param("body"),         create_user)?;
    /// # Ok(()) }
    /// ```
    pub fn route(mut self, route: Route, handler: impl Handler) -> Result<Self, Error> {
        let methods = route.effective_methods();
        let pattern = Pattern::compile(route.kind, &route.pattern)?;

        if pattern.kind() == PatternKind::Exact {
            let taken = self.entries.iter().find(|e| {
                e.kind() == PatternKind::Exact
                    && e.pattern() == pattern.source()
                    && methods.iter().any(|m| e.accepts(*m))
            });
            if let Some(existing) = taken {
                let method = methods.iter().copied().find(|m| existing.accepts(*m)).unwrap_or(Method::Get);
                return Err(Error::DuplicateRoute { method, path: route.pattern });
            }
        }

        let params = route
            .params
            .iter()
            .map(|name| (Arc::from(name.as_str()), ParamKind::of(name)))
            .collect();

        debug!(
            methods = ?methods,
            kind = ?pattern.kind(),
            pattern = %pattern.source(),
            "route registered"
        );

        self.entries.push(RouteEntry {
            methods,
            pattern,
            handler: handler.into_boxed_handler(),
            params,
        });
        Ok(self)
    }

    /// Registers every route a handler object declares.
    pub fn add_handler(self, set: impl RouteSet) -> Result<Self, Error> {
        set.register(self)
    }

    /// Every registered route, in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Finds the route answering `method` + `path`.
    pub fn resolve(&self, method: Method, path: &str) -> Result<Match<'_>, RoutingError> {
        matcher::resolve(&self.entries, method, path)
    }

    /// The routing outcome for a request whose verb no route can accept.
    pub(crate) fn unrouted(&self, path: &str) -> RoutingError {
        matcher::unrouted(&self.entries, path)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Args;

    async fn noop(_: Args) {}

    fn matched(router: &Router, method: Method, path: &str) -> Option<String> {
        router.resolve(method, path).ok().map(|m| m.entry.pattern().to_owned())
    }

    #[test]
    fn exact_wins_regardless_of_registration_order() {
        let router = Router::new()
            .route(Route::regex("/items/.*"), noop).unwrap()
            .route(Route::template("/items/{id}"), noop).unwrap()
            .route(Route::exact("/items/special"), noop).unwrap();

        assert_eq!(matched(&router, Method::Get, "/items/special").as_deref(), Some("/items/special"));
        assert_eq!(matched(&router, Method::Get, "/items/7").as_deref(), Some("/items/{id}"));
        assert_eq!(matched(&router, Method::Get, "/items/7/x").as_deref(), Some("/items/.*"));
    }

    #[test]
    fn first_registered_wins_within_a_kind() {
        let router = Router::new()
            .route(Route::template("/a/{x}"), noop).unwrap()
            .route(Route::template("/a/{y}"), noop).unwrap()
            .route(Route::regex("/b/.*"), noop).unwrap()
            .route(Route::regex("/b/(.*)"), noop).unwrap();

        let m = router.resolve(Method::Get, "/a/1").unwrap();
        assert_eq!(m.entry.pattern(), "/a/{x}");
        assert_eq!(m.variables.get("x").map(String::as_str), Some("1"));
        assert_eq!(matched(&router, Method::Get, "/b/1").as_deref(), Some("/b/.*"));
    }

    #[test]
    fn method_filter_and_405() {
        let router = Router::new()
            .route(Route::post("/test-post"), noop).unwrap()
            .route(Route::template("/test-post/{id}").method(Method::Delete), noop).unwrap();

        assert!(router.resolve(Method::Post, "/test-post").is_ok());
        assert_eq!(
            router.resolve(Method::Get, "/test-post").unwrap_err(),
            RoutingError::MethodNotAllowed { allowed: vec![Method::Post] }
        );
        assert_eq!(
            router.resolve(Method::Get, "/nowhere").unwrap_err(),
            RoutingError::NoRouteFound
        );
    }

    #[test]
    fn one_route_many_methods() {
        let router = Router::new()
            .route(Route::exact("/foo").methods([Method::Get, Method::Post]), noop)
            .unwrap();
        assert!(router.resolve(Method::Get, "/foo").is_ok());
        assert!(router.resolve(Method::Post, "/foo").is_ok());
        assert!(router.resolve(Method::Put, "/foo").is_err());
    }

    #[test]
    fn duplicate_exact_route_is_rejected() {
        let err = Router::new()
            .route(Route::get("/dup"), noop).unwrap()
            .route(Route::exact("/dup").methods([Method::Post, Method::Get]), noop)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { method: Method::Get, ref path } if path == "/dup"));

        // Same path, different method is fine.
        assert!(Router::new()
            .route(Route::get("/dup"), noop).unwrap()
            .route(Route::post("/dup"), noop)
            .is_ok());
    }

    #[test]
    fn entries_keep_registration_order_and_params() {
        let router = Router::new()
            .route(Route::post("/b").params(["body", "headers"]), noop).unwrap()
            .route(Route::get("/a"), noop).unwrap();

        let patterns: Vec<_> = router.entries().iter().map(RouteEntry::pattern).collect();
        assert_eq!(patterns, ["/b", "/a"]);
        assert_eq!(router.entries()[0].params().collect::<Vec<_>>(), ["body", "headers"]);
    }

    #[test]
    fn add_handler_registers_a_route_set() {
        struct Pair;
        impl RouteSet for Pair {
            fn register(self, router: Router) -> Result<Router, Error> {
                router.route(Route::get("/one"), noop)?.route(Route::get("/two"), noop)
            }
        }

        let router = Router::new().add_handler(Pair).unwrap();
        assert_eq!(router.entries().len(), 2);
    }
}
