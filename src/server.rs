//! HTTP server and graceful shutdown.
//!
//! # Lifecycle
//!
//! [`Server`] collects routes and default headers. [`Server::start`] binds the
//! socket, freezes the router and returns a [`Listening`] handle; only that
//! handle can serve. Routes cannot be added once the server has started.
//!
//! # Graceful shutdown
//!
//! [`Listening::serve_forever`] returns after SIGTERM or Ctrl-C:
//! 1. `accept()` stops immediately, so no new connections are taken.
//! 2. Every in-flight connection task runs to completion.
//! 3. `serve_forever` returns and `main` can exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http::header::{CONTENT_LENGTH, HeaderName, HeaderValue};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::handler::Handler;
use crate::headers::HttpHeaders;
use crate::method::Method;
use crate::request::Request;
use crate::response::{Body, Response};
use crate::route::Route;
use crate::router::{RouteSet, Router};
use crate::status::Status;

/// Response body handed to hyper: buffered bytes or a file read in chunks.
type WireBody = BoxBody<Bytes, std::io::Error>;

/// The HTTP server, before it starts listening.
///
/// ```rust,no_run
/// use tsuji::{Args, HttpHeaders, Json, Route, Server};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), tsuji::Error> {
///     Server::new()
///         .route(Route::get("/test-get"), |_: Args| async {
///             Json(serde_json::json!({"a": 10}))
///         })?
///         .add_default_response_headers(HttpHeaders::from([("Access-Control-Allow-Origin", "*")]))
///         .start("127.0.0.1:8888")
///         .await?
///         .serve_forever()
///         .await
/// }
/// ```
pub struct Server {
    router: Router,
    default_headers: HttpHeaders,
    config: ServerConfig,
}

impl Server {
    pub fn new() -> Self {
        Self::with_router(Router::new())
    }

    pub fn with_router(router: Router) -> Self {
        Self { router, default_headers: HttpHeaders::new(), config: ServerConfig::default() }
    }

    pub fn config(self, config: ServerConfig) -> Self {
        Self { config, ..self }
    }

    pub fn route(self, route: Route, handler: impl Handler) -> Result<Self, Error> {
        Ok(Self { router: self.router.route(route, handler)?, ..self })
    }

    /// Registers every route a handler object declares.
    pub fn add_handler(self, set: impl RouteSet) -> Result<Self, Error> {
        Ok(Self { router: self.router.add_handler(set)?, ..self })
    }

    /// Headers appended to every response, error responses included.
    pub fn add_default_response_headers(mut self, headers: HttpHeaders) -> Self {
        self.default_headers.merge(&headers);
        self
    }

    /// Freezes the routes without opening a socket. Useful for driving the
    /// dispatcher directly.
    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher::new(self.router, self.default_headers)
    }

    /// Binds `addr` and closes registration.
    pub async fn start(self, addr: impl ToSocketAddrs) -> Result<Listening, Error> {
        let listener = TcpListener::bind(addr).await?;
        let config = self.config.clone();
        let dispatcher = Arc::new(self.into_dispatcher());

        info!(
            addr = %listener.local_addr()?,
            routes = dispatcher.router().entries().len(),
            "tsuji listening"
        );
        Ok(Listening { listener, dispatcher, config })
    }
}

impl Default for Server {
    fn default() -> Self { Self::new() }
}

/// A bound server, ready to serve.
pub struct Listening {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
}

impl Listening {
    /// The address actually bound; useful after binding port `0`.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until SIGTERM or Ctrl-C, then drains in-flight connections.
    pub async fn serve_forever(self) -> Result<(), Error> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains in-flight connections.
    pub async fn serve_with_shutdown(self, signal: impl Future<Output = ()>) -> Result<(), Error> {
        let Self { listener, dispatcher, config } = self;

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting at once,
                // even with connections queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = Arc::clone(&dispatcher);
                    let read_timeout = config.read_timeout;
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let dispatcher = Arc::clone(&dispatcher);
                            async move { Ok::<_, Infallible>(handle(&dispatcher, req).await) }
                        });

                        let mut conn = http1::Builder::new();
                        conn.timer(TokioTimer::new()).header_read_timeout(read_timeout);

                        if let Err(e) = conn.serve_connection(io, svc).await {
                            warn!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("tsuji stopped");
        Ok(())
    }
}

// ── Request / response conversion ─────────────────────────────────────────────

async fn handle(dispatcher: &Dispatcher, req: hyper::Request<Incoming>) -> hyper::Response<WireBody> {
    let response = match read_request(dispatcher, req).await {
        Ok(request) => dispatcher.dispatch(request).await,
        Err(rejected) => rejected,
    };
    write_response(dispatcher, response).await
}

/// Converts the hyper request. A verb outside [`Method`] is routed by path
/// alone and never reaches a handler.
async fn read_request(dispatcher: &Dispatcher, req: hyper::Request<Incoming>) -> Result<Request, Response> {
    let (parts, body) = req.into_parts();

    let method = Method::try_from(&parts.method)
        .map_err(|_| dispatcher.unsupported_method(parts.method.as_str(), parts.uri.path()))?;

    let mut headers = HttpHeaders::new();
    for (name, value) in &parts.headers {
        match value.to_str() {
            Ok(v) => {
                headers.add(name.as_str(), v);
            }
            Err(_) => warn!(header = %name, "dropping non-ASCII request header"),
        }
    }

    let body = body
        .collect()
        .await
        .map_err(|e| {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            dispatcher.failure(Status::BadRequest)
        })?
        .to_bytes();

    Ok(Request::new(method, parts.uri.path())
        .with_version(parts.version)
        .with_headers(headers)
        .with_body(body))
}

/// Converts to the hyper type. File bodies are streamed from disk; a file
/// that cannot be opened turns the whole response into a 500.
async fn write_response(dispatcher: &Dispatcher, response: Response) -> hyper::Response<WireBody> {
    let path = match &response.body {
        Body::Bytes(bytes) => return assemble(&response, buffered(bytes.clone())),
        Body::File(path) => path,
    };

    let opened = async {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok::<_, std::io::Error>((file, len))
    };
    match opened.await {
        Ok((file, len)) => {
            let stream = ReaderStream::new(file).map_ok(Frame::data);
            let mut res = assemble(&response, StreamBody::new(stream).boxed());
            res.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(len));
            res
        }
        Err(e) => {
            error!(path = %path.display(), "cannot open file body: {e}");
            let failure = dispatcher.failure(Status::InternalServerError);
            let body = failure.body.as_bytes().cloned().unwrap_or_default();
            assemble(&failure, buffered(body))
        }
    }
}

fn buffered(bytes: Bytes) -> WireBody {
    Full::new(bytes).map_err(|never| match never {}).boxed()
}

fn assemble(response: &Response, body: WireBody) -> hyper::Response<WireBody> {
    let mut res = hyper::Response::new(body);
    *res.status_mut() =
        http::StatusCode::from_u16(response.status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in response.headers.iter() {
        // hyper derives the length from the body.
        if name == "content-length" {
            continue;
        }
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(n), Ok(v)) => {
                res.headers_mut().append(n, v);
            }
            _ => warn!(header = name, "dropping invalid response header"),
        }
    }
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. A signal that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_copies_headers_and_skips_content_length() {
        let response = Response::builder()
            .status(Status::Created)
            .header("Set-Cookie", "a=1")
            .header("set-cookie", "b=2")
            .header("Content-Length", "999")
            .header("bad header", "x")
            .body(&b"hi"[..]);

        let res = assemble(&response, buffered(Bytes::from_static(b"hi")));
        assert_eq!(res.status(), http::StatusCode::CREATED);
        assert_eq!(res.headers().get_all("set-cookie").iter().count(), 2);
        assert!(res.headers().get("content-length").is_none());
        assert_eq!(res.headers().len(), 2);
    }

    #[tokio::test]
    async fn unreadable_file_becomes_500() {
        let dispatcher = Server::new()
            .add_default_response_headers(HttpHeaders::from([("X-Default", "1")]))
            .into_dispatcher();
        let res = write_response(&dispatcher, Response::file("/definitely/not/here.txt")).await;
        assert_eq!(res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers().get("x-default").map(|v| v.as_bytes()), Some(&b"1"[..]));
    }

    #[tokio::test]
    async fn file_body_is_streamed_in_chunks() {
        let path = std::env::temp_dir().join(format!("tsuji-file-body-{}", std::process::id()));
        let contents: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &contents).await.unwrap();

        let dispatcher = Server::new().into_dispatcher();
        let res = write_response(&dispatcher, Response::file(&path)).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(
            res.headers().get("content-length").and_then(|v| v.to_str().ok()),
            Some("100000")
        );

        let mut body = res.into_body();
        let mut frames = 0;
        let mut received = Vec::new();
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame.unwrap().into_data() {
                frames += 1;
                received.extend_from_slice(&data);
            }
        }
        assert!(frames > 1, "file arrived in {frames} frame(s)");
        assert_eq!(received, contents);

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
