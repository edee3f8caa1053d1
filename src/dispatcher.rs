//! Request dispatch.
//!
//! One request in, one response out: resolve → bind → invoke → adapt. Every
//! failure along the way becomes a response here, so the transport never
//! sees an error and one bad request never affects another.
//!
//! | failure                       | status |
//! |-------------------------------|--------|
//! | no route for the path         | 404    |
//! | path known, method not        | 405    |
//! | body is not JSON              | 400    |
//! | parameter cannot be bound     | 500    |
//! | handler error or panic        | 500    |

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, warn};

use crate::adapter;
use crate::binder::{self, Args};
use crate::error::{HandlerError, RoutingError};
use crate::handler::{BoxedHandler, Reply};
use crate::headers::HttpHeaders;
use crate::request::{Request, clean_path};
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// Routes requests through a frozen [`Router`].
///
/// Cheap to share: the router sits behind an `Arc` and is only ever read.
pub struct Dispatcher {
    router: Arc<Router>,
    default_headers: HttpHeaders,
}

impl Dispatcher {
    pub fn new(router: Router, default_headers: HttpHeaders) -> Self {
        Self { router: Arc::new(router), default_headers }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Produces the response for `request`. Never fails.
    pub async fn dispatch(&self, request: Request) -> Response {
        let response = self.respond(&request).await;
        adapter::with_default_headers(response, &self.default_headers)
    }

    /// A bodyless failure response carrying the default headers.
    pub(crate) fn failure(&self, status: Status) -> Response {
        adapter::with_default_headers(Response::plain(status), &self.default_headers)
    }

    /// Answers a request whose method is outside [`Method`](crate::Method): `405` when the
    /// path is routed under other methods, `404` otherwise.
    pub(crate) fn unsupported_method(&self, method: &str, path: &str) -> Response {
        let e = self.router.unrouted(&clean_path(path.to_owned()));
        warn!(method, path, "unsupported method: {e}");
        adapter::with_default_headers(routing_failure(&e), &self.default_headers)
    }

    async fn respond(&self, request: &Request) -> Response {
        let method = request.method();
        let path = request.path();
        debug!(%method, path, "request received");

        let matched = match self.router.resolve(method, path) {
            Ok(m) => m,
            Err(e) => {
                warn!(%method, path, "{e}");
                return routing_failure(&e);
            }
        };
        debug!(%method, path, route = matched.entry.pattern(), "route matched");

        let args = match binder::bind(&matched.entry.params, request, &matched.variables) {
            Ok(args) => args,
            Err(e) => {
                warn!(%method, path, route = matched.entry.pattern(), "binding failed: {e}");
                return Response::plain(e.status());
            }
        };

        match invoke(&matched.entry.handler, args).await {
            Ok(reply) => adapter::into_response(reply).unwrap_or_else(|e| {
                error!(%method, path, "reply serialisation failed: {e}");
                Response::plain(Status::InternalServerError)
            }),
            Err(e) => {
                error!(%method, path, route = matched.entry.pattern(), "handler failed: {e:#}");
                Response::plain(Status::InternalServerError)
            }
        }
    }
}

/// Runs the handler, turning a panic into an ordinary handler error.
async fn invoke(handler: &BoxedHandler, args: Args) -> Result<Reply, HandlerError> {
    let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(args))) {
        Ok(fut) => fut,
        Err(payload) => return Err(panicked(&*payload)),
    };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(panicked(&*payload)),
    }
}

fn panicked(payload: &(dyn std::any::Any + Send)) -> HandlerError {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    anyhow::anyhow!("handler panicked: {message}")
}

fn routing_failure(e: &RoutingError) -> Response {
    let response = Response::plain(e.status());
    match e {
        RoutingError::NoRouteFound => response,
        RoutingError::MethodNotAllowed { allowed } => {
            let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
            let mut response = response;
            response.headers.set("allow", allow);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::{Json, sync_handler};
    use crate::method::Method;
    use crate::route::Route;

    fn body(res: &Response) -> &[u8] {
        res.body().as_bytes().map(|b| b.as_ref()).unwrap_or_default()
    }

    fn json_body(res: &Response) -> Value {
        serde_json::from_slice(body(res)).unwrap()
    }

    fn dispatcher(router: Router) -> Dispatcher {
        Dispatcher::new(router, HttpHeaders::from([("Access-Control-Allow-Origin", "*")]))
    }

    #[tokio::test]
    async fn unmatched_path_is_404_with_default_headers() {
        let d = dispatcher(Router::new());
        let res = d.dispatch(Request::new(Method::Get, "/missing")).await;
        assert_eq!(res.status_code(), 404);
        assert_eq!(res.headers().get("access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_allow() {
        let router = Router::new()
            .route(Route::post("/test-post").param("body"), |mut a: Args| async move { a.take_body() })
            .unwrap();
        let res = dispatcher(router).dispatch(Request::new(Method::Get, "/test-post")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.headers().get("allow"), Some("POST"));
    }

    #[test]
    fn unsupported_method_is_404_or_405_by_path() {
        let router = Router::new()
            .route(Route::exact("/known").methods([Method::Get, Method::Post]), |_: Args| async {})
            .unwrap();
        let d = dispatcher(router);

        let res = d.unsupported_method("BREW", "/known");
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.headers().get("allow"), Some("GET, POST"));
        assert_eq!(res.headers().get("access-control-allow-origin"), Some("*"));

        let res = d.unsupported_method("BREW", "/unknown");
        assert_eq!(res.status_code(), 404);
        assert!(!res.headers().contains("allow"));
        assert_eq!(res.headers().get("access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn malformed_body_is_400_and_unresolvable_param_is_500() {
        let router = Router::new()
            .route(Route::post("/p").param("body"), |_: Args| async {})
            .unwrap()
            .route(Route::get("/q").param("nope"), |_: Args| async {})
            .unwrap();
        let d = dispatcher(router);

        let res = d.dispatch(Request::new(Method::Post, "/p").with_body("{oops")).await;
        assert_eq!(res.status_code(), 400);
        let res = d.dispatch(Request::new(Method::Post, "/p")).await;
        assert_eq!(res.status_code(), 400);
        assert_eq!(res.headers().get("access-control-allow-origin"), Some("*"));
        let res = d.dispatch(Request::new(Method::Get, "/q")).await;
        assert_eq!(res.status_code(), 500);
    }

    #[tokio::test]
    async fn handler_failures_are_500_without_details() {
        let router = Router::new()
            .route(Route::get("/err"), |_: Args| async {
                Err::<(), _>(anyhow::anyhow!("secret database password"))
            })
            .unwrap()
            .route(Route::get("/panic"), sync_handler(|_: Args| -> Json<()> { panic!("kaboom") }))
            .unwrap()
            .route(Route::get("/async-panic"), |_: Args| async {
                tokio::task::yield_now().await;
                if true {
                    panic!("later kaboom");
                }
            })
            .unwrap()
            .route(Route::get("/ok"), sync_handler(|_: Args| Json(json!({"a": 10}))))
            .unwrap();
        let d = dispatcher(router);

        for path in ["/err", "/panic", "/async-panic"] {
            let res = d.dispatch(Request::new(Method::Get, path)).await;
            assert_eq!(res.status_code(), 500, "{path}");
            assert_eq!(body(&res), b"Internal Server Error");
        }

        // The dispatcher keeps serving afterwards.
        let res = d.dispatch(Request::new(Method::Get, "/ok")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(json_body(&res), json!({"a": 10}));
    }

    #[tokio::test]
    async fn templated_route_returns_its_variables() {
        let router = Router::new()
            .route(
                Route::template("/aaa/{bbb}/ccc/{ddd}").param("uri_variables"),
                |a: Args| async move { Json(a.uri_variables().cloned()) },
            )
            .unwrap();
        let res = dispatcher(router).dispatch(Request::new(Method::Get, "/aaa/FOO/ccc/BAR")).await;
        assert_eq!(json_body(&res), json!({"bbb": "FOO", "ddd": "BAR"}));
    }

    #[tokio::test]
    async fn repeated_get_is_byte_identical() {
        let router = Router::new()
            .route(
                Route::template("/v/{a}/{b}/{c}").param("uri_variables"),
                |a: Args| async move { Json(a.uri_variables().cloned()) },
            )
            .unwrap();
        let d = dispatcher(router);
        let first = d.dispatch(Request::new(Method::Get, "/v/1/2/3")).await;
        let second = d.dispatch(Request::new(Method::Get, "/v/1/2/3")).await;
        assert_eq!(first.status_code(), second.status_code());
        assert_eq!(first.headers(), second.headers());
        assert_eq!(body(&first), body(&second));
    }
}
