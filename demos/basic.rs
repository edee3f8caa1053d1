//! Minimal tsuji example: one handler object, every kind of route.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -X GET http://localhost:8888/bar -d '{}'
//!   curl -X POST http://localhost:8888/test-post -d '{"foo":"x"}'
//!   curl http://localhost:8888/aaa/FOO/ccc/BAR
//!   curl http://localhost:8888/any/thing/at/all
//!   curl -i http://localhost:8888/test-custom-response
//!   curl http://localhost:8888/send-file

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tsuji::{
    Args, Error, HttpHeaders, Json, Method, Response, Route, RouteSet, Router, Server,
    ServerConfig, sync_handler,
};

struct Demo {
    greeting: String,
}

impl RouteSet for Demo {
    fn register(self, router: Router) -> Result<Router, Error> {
        let me = Arc::new(self);

        router
            // GET and POST on one path; the whole request is available.
            .route(
                Route::exact("/foo").methods([Method::Get, Method::Post]).param("request"),
                sync_handler(|args: Args| {
                    args.request().map(|r| format!("{} {}", r.method(), r.path()))
                }),
            )?
            .route(Route::get("/bar").params(["body", "headers"]), sync_handler(|_: Args| {
                Json(json!({"a": 10}))
            }))?
            // Echoes the parsed body.
            .route(Route::post("/test-post").param("body"), |mut args: Args| async move {
                args.take_body()
            })?
            // Suspends without holding up other requests; answers 204.
            .route(Route::get("/async-sleep"), |_: Args| async {
                tokio::time::sleep(Duration::from_secs(4)).await;
            })?
            // A single variable bound by name.
            .route(Route::template("/aaa/{bbb}").param("bbb"), move |args: Args| {
                let me = Arc::clone(&me);
                async move {
                    Json(format!("{} {}", me.greeting, args.var("bbb").unwrap_or_default()))
                }
            })?
            .route(
                Route::template("/aaa/{bbb}/ccc/{ddd}").param("uri_variables"),
                |args: Args| async move { Json(args.uri_variables().cloned()) },
            )?
            .route(Route::regex("/any/(.*)").param("request"), sync_handler(|args: Args| {
                args.request().map(|r| r.path().to_owned())
            }))?
            .route(Route::regex("/send-file"), sync_handler(|_: Args| Response::file("Cargo.toml")))?
            .route(Route::get("/test-custom-response"), sync_handler(|_: Args| {
                Response::builder()
                    .header("X-Foo", "custom stuff")
                    .body(&b"test-body"[..])
            }))?
            .route(Route::delete("/test-delete").param("body"), sync_handler(|args: Args| {
                Json(json!({"x": 1, "y": args.body()}))
            }))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let server = Server::new()
        .config(ServerConfig::from_env())
        .add_handler(Demo { greeting: "hello".to_owned() })?
        .add_default_response_headers(HttpHeaders::from([
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "*"),
        ]))
        .start("127.0.0.1:8888")
        .await?;

    tracing::info!(addr = %server.local_addr()?, "serving");
    server.serve_forever().await
}
