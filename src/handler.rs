//! Handler trait, type erasure and return values.
//!
//! # Two kinds of handler, one call path
//!
//! Handlers come in two shapes:
//!
//! ```text
//! async fn echo(args: Args) -> impl IntoReply { … }      ← suspends
//! fn hello(args: Args) -> impl IntoReply { … }            ← returns at once
//!        ↓ sync_handler(hello)
//! ```
//!
//! Both are erased into the same [`BoxedHandler`], whose `call` returns a
//! boxed future. A synchronous handler runs inside `call` and hands back an
//! already-completed future; an async handler hands back its own future. The
//! dispatcher awaits either one the same way, so it never needs to know which
//! kind it is holding.
//!
//! The per-request cost is one `Arc` clone and one virtual call.

use std::future::{Future, ready};
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::binder::Args;
use crate::error::HandlerError;
use crate::response::Response;
use crate::status::Status;

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a handler produced, before it becomes a [`Response`].
#[derive(Clone, Debug)]
pub enum Reply {
    /// A fully built response, sent as is (plus default headers).
    Response(Response),
    /// A value serialised to a `200 OK` JSON body.
    Value(Value),
    /// Nothing to say: `204 No Content`.
    Empty,
}

impl Reply {
    /// Captures any serialisable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, HandlerError> {
        Ok(Self::Value(serde_json::to_value(value)?))
    }
}

/// Serialise `T` into the reply body: `Json(user)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json<T>(pub T);

/// Conversion of a handler's return value into a [`Reply`].
///
/// Returning `Err` from a handler, or any value whose conversion fails,
/// produces `500 Internal Server Error`.
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, HandlerError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, HandlerError> { Ok(self) }
}

impl IntoReply for Response {
    fn into_reply(self) -> Result<Reply, HandlerError> { Ok(Reply::Response(self)) }
}

impl IntoReply for Status {
    fn into_reply(self) -> Result<Reply, HandlerError> { Ok(Reply::Response(Response::status(self))) }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, HandlerError> { Ok(Reply::Value(self)) }
}

/// A string is a JSON string: `"/any/foo"` goes out as `"\"/any/foo\""`.
impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, HandlerError> { Ok(Reply::Value(Value::String(self))) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, HandlerError> { self.to_owned().into_reply() }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, HandlerError> { Ok(Reply::Empty) }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> { Reply::json(&self.0) }
}

/// `None` is an empty reply.
impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        match self {
            Some(v) => v.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<HandlerError>,
{
    fn into_reply(self) -> Result<Reply, HandlerError> {
        self.map_err(Into::into)?.into_reply()
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to the handler outcome.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<Reply, HandlerError>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, args: Args) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any async function or closure shaped
/// `Fn(Args) -> impl Future<Output = impl IntoReply>`, and by
/// [`sync_handler`] wrapping a plain `Fn(Args) -> impl IntoReply`.
///
/// The trait is sealed: only the impls in this module can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Async handlers ────────────────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Args) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn call(&self, args: Args) -> BoxFuture {
        let fut = (self.0)(args);
        Box::pin(async move { fut.await.into_reply() })
    }
}

// ── Synchronous handlers ──────────────────────────────────────────────────────

/// A handler that computes its reply without suspending.
///
/// Built with [`sync_handler`].
pub struct SyncHandler<F>(F);

/// Wraps a plain function so it can be registered as a handler.
///
/// ```rust
/// use tsuji::{sync_handler, Args, Json, Route, Router};
///
/// fn bar(_args: Args) -> Json<serde_json::Value> {
///     Json(serde_json::json!({"a": 10}))
/// }
///
/// # fn main() -> Result<(), tsuji::Error> {
/// let router = Router::new().route(Route::get("/bar"), sync_handler(bar))?;
/// # Ok(()) }
/// ```
pub fn sync_handler<F, R>(f: F) -> SyncHandler<F>
where
    F: Fn(Args) -> R + Send + Sync + 'static,
    R: IntoReply,
{
    SyncHandler(f)
}

impl<F, R> private::Sealed for SyncHandler<F>
where
    F: Fn(Args) -> R + Send + Sync + 'static,
    R: IntoReply,
{
}

impl<F, R> Handler for SyncHandler<F>
where
    F: Fn(Args) -> R + Send + Sync + 'static,
    R: IntoReply,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl<F, R> ErasedHandler for SyncHandler<F>
where
    F: Fn(Args) -> R,
    R: IntoReply,
{
    fn call(&self, args: Args) -> BoxFuture {
        Box::pin(ready((self.0)(args).into_reply()))
    }
}
