//! # tsuji
//!
//! A small async HTTP server built around one job: getting a request to the
//! right handler with the right arguments.
//!
//! ## Routing
//!
//! Three kinds of route, tried in this order whatever order they were
//! registered in:
//!
//! 1. **Exact**: `Route::get("/test-get")`
//! 2. **Template**: `Route::template("/aaa/{bbb}/ccc/{ddd}")`, where each
//!    `{name}` matches one non-empty path segment
//! 3. **Regex**: `Route::regex("/any/(.*)")`, matched against the whole path
//!
//! Within one kind the first registered route wins. A path that only matches
//! under other methods answers `405` with an `Allow` header; anything else
//! unmatched answers `404`.
//!
//! ## Arguments by name
//!
//! A route declares the parameter names its handler wants, and each name has
//! a fixed source: `request`, `headers`, `raw_body`, `body` (parsed JSON),
//! `uri_variables`, or the name of a single path variable. See [`Args`].
//!
//! ## Replies
//!
//! Return a [`Response`] to control everything, or any [`IntoReply`] value
//! (`Json(..)`, `serde_json::Value`, `String`, `()`, `Result<_, _>`, ...) and
//! let tsuji serialise it as `200 application/json`. Errors and panics become
//! `500` without leaking their details.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tsuji::{Args, HttpHeaders, Json, Route, Server, sync_handler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), tsuji::Error> {
//!     let server = Server::new()
//!         .route(Route::get("/test-get"), sync_handler(|_: Args| {
//!             Json(serde_json::json!({"a": 10}))
//!         }))?
//!         .route(Route::post("/test-post").param("body"), |mut args: Args| async move {
//!             args.take_body()
//!         })?
//!         .route(Route::template("/users/{id}").param("id"), get_user)?
//!         .add_default_response_headers(HttpHeaders::from([
//!             ("Access-Control-Allow-Origin", "*"),
//!         ]));
//!
//!     server.start("127.0.0.1:8888").await?.serve_forever().await
//! }
//!
//! async fn get_user(args: Args) -> Json<String> {
//!     Json(format!("user {}", args.var("id").unwrap_or("unknown")))
//! }
//! ```

mod adapter;
mod binder;
mod config;
mod dispatcher;
mod error;
mod handler;
mod headers;
mod matcher;
mod method;
mod request;
mod response;
mod route;
mod router;
mod server;
mod status;

pub use binder::{Arg, Args};
pub use config::{READ_TIMEOUT_ENV, ServerConfig};
pub use dispatcher::Dispatcher;
pub use error::{BindingError, Error, HandlerError, RoutingError};
pub use handler::{Handler, IntoReply, Json, Reply, SyncHandler, sync_handler};
pub use headers::HttpHeaders;
pub use matcher::{Match, UriVariables};
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{Body, ContentType, Response, ResponseBuilder};
pub use route::{ParamKind, PatternKind, Route};
pub use router::{RouteEntry, RouteSet, Router};
pub use server::{Listening, Server};
pub use status::Status;
