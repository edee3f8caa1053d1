//! Outgoing HTTP response type.
//!
//! A handler either builds a [`Response`] itself or returns a plain value and
//! lets the dispatcher serialise it. Both end up here.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::headers::HttpHeaders;
use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Body ──────────────────────────────────────────────────────────────────────

/// Response payload: bytes already in memory, or a file the transport streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Bytes(Bytes),
    File(PathBuf),
}

impl Body {
    pub fn empty() -> Self {
        Self::Bytes(Bytes::new())
    }

    /// The in-memory bytes, or `None` for a file body.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::File(_) => None,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts
///
/// ```rust
/// use tsuji::{Response, Status};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(Status::NoContent);
/// Response::file("LICENSE");
/// ```
///
/// # Builder
///
/// ```rust
/// use tsuji::{ContentType, Response, Status};
///
/// Response::builder()
///     .status(Status::Ok)
///     .header("X-Foo", "custom stuff")
///     .bytes(ContentType::OctetStream, b"test-body".to_vec());
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) status: u16,
    pub(crate) headers: HttpHeaders,
    pub(crate) body: Body,
}

impl Response {
    /// `200 OK` with `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `200 OK` whose body is read from `path` by the transport.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::builder().file(path)
    }

    /// Response with no body.
    pub fn status(code: impl Into<u16>) -> Self {
        Self { status: code.into(), headers: HttpHeaders::new(), body: Body::empty() }
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HttpHeaders::new(), status: Status::Ok.code() }
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn headers(&self) -> &HttpHeaders { &self.headers }
    pub fn body(&self) -> &Body { &self.body }

    /// Plain-text response whose body is the canonical reason phrase.
    pub(crate) fn plain(status: Status) -> Self {
        Self::builder().status(status).text(status.reason())
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// body method, so the content type is always decided.
pub struct ResponseBuilder {
    headers: HttpHeaders,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: impl Into<u16>) -> Self {
        self.status = code.into();
        self
    }

    /// Adds a header. Repeating a name adds another value.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn headers(mut self, headers: &HttpHeaders) -> Self {
        self.headers.merge(headers);
        self
    }

    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(Some(ContentType::Json.as_str()), Body::Bytes(body.into()))
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(Some(ContentType::Text.as_str()), Body::Bytes(Bytes::from(body.into())))
    }

    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(Some(content_type.as_str()), Body::Bytes(body.into()))
    }

    /// Raw body with whatever headers were set explicitly, nothing added.
    pub fn body(self, body: impl Into<Bytes>) -> Response {
        self.finish(None, Body::Bytes(body.into()))
    }

    /// File body; the transport reads it when writing the response.
    pub fn file(self, path: impl AsRef<Path>) -> Response {
        self.finish(None, Body::File(path.as_ref().to_path_buf()))
    }

    pub fn no_body(self) -> Response {
        self.finish(None, Body::empty())
    }

    fn finish(self, content_type: Option<&str>, body: Body) -> Response {
        let mut headers = self.headers;
        if let Some(ct) = content_type {
            if !headers.contains("content-type") {
                headers.set("content-type", ct);
            }
        }
        Response { status: self.status, headers, body }
    }
}
