//! Error types.
//!
//! [`Error`] covers setup and infrastructure: bad route declarations and
//! socket failures. Everything that can go wrong while answering a single
//! request is a [`RoutingError`], a [`BindingError`] or a [`HandlerError`],
//! and each of those ends as an HTTP response, never as a crashed server.

use crate::method::Method;
use crate::status::Status;

/// The error type returned by tsuji's fallible setup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid route `{pattern}`: {reason}")]
    InvalidRoute { pattern: String, reason: String },

    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: Method, path: String },
}

/// No registered route accepts the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("no route matches the request path")]
    NoRouteFound,

    /// The path is known, but only under other methods.
    #[error("method not allowed; path accepts {}", list(.allowed))]
    MethodNotAllowed { allowed: Vec<Method> },
}

impl RoutingError {
    pub fn status(&self) -> Status {
        match self {
            Self::NoRouteFound => Status::NotFound,
            Self::MethodNotAllowed { .. } => Status::MethodNotAllowed,
        }
    }
}

/// A handler parameter could not be produced from the request.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("parameter `{0}` matches neither a reserved name nor a path variable")]
    UnresolvableParameter(String),

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),
}

impl BindingError {
    pub fn status(&self) -> Status {
        match self {
            Self::UnresolvableParameter(_) => Status::InternalServerError,
            Self::MalformedBody(_) => Status::BadRequest,
        }
    }
}

/// Any failure raised by handler code.
pub type HandlerError = anyhow::Error;

fn list(methods: &[Method]) -> String {
    methods.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
}
