//! Incoming HTTP request type.

use bytes::Bytes;

use crate::headers::HttpHeaders;
use crate::method::Method;

/// An incoming HTTP request.
///
/// Built once by the transport (or by hand in tests) and never mutated while
/// it is routed, bound and handed to a handler. Cloning is cheap: the body is
/// a reference-counted [`Bytes`].
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    version: http::Version,
    headers: HttpHeaders,
    body: Bytes,
}

impl Request {
    /// A bodiless HTTP/1.1 request. `path` must not carry a query string.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: clean_path(path.into()),
            version: http::Version::HTTP_11,
            headers: HttpHeaders::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HttpHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_version(mut self, version: http::Version) -> Self {
        self.version = version;
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn version(&self) -> http::Version { self.version }
    pub fn headers(&self) -> &HttpHeaders { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup; first value wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// Collapses a leading run of slashes to one.
///
/// Clients read `//host/path` as a scheme-relative URL, so a path like that
/// echoed into a `Location` header becomes an open redirect.
pub(crate) fn clean_path(path: String) -> String {
    if path.starts_with("//") {
        format!("/{}", path.trim_start_matches('/'))
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_leading_slashes() {
        assert_eq!(Request::new(Method::Get, "//evil.example/x").path(), "/evil.example/x");
        assert_eq!(Request::new(Method::Get, "/a//b").path(), "/a//b");
        assert_eq!(Request::new(Method::Get, "/").path(), "/");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::new(Method::Post, "/foo")
            .with_header("Content-Length", "3")
            .with_header("X-Foo", "10")
            .with_body("abc");
        assert_eq!(req.header("x-foo"), Some("10"));
        assert_eq!(req.headers().len(), 2);
        assert_eq!(req.body().as_ref(), b"abc");
    }
}
