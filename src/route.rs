//! Route declarations.
//!
//! A [`Route`] says *where* a handler lives (methods + path pattern) and
//! *what it wants* (its parameter names). It is inert until handed to
//! [`Router::route`](crate::Router::route), which compiles the pattern and
//! resolves every parameter name to a [`ParamKind`] once, up front.
//!
//! ```rust
//! use tsuji::{Method, Route};
//!
//! Route::get("/test-get");
//! Route::post("/test-post").param("body");
//! Route::template("/aaa/{bbb}/ccc/{ddd}").param("uri_variables");
//! Route::regex("/any/(.*)").methods([Method::Get, Method::Head]).param("request");
//! ```

use crate::method::Method;

/// How a route's path is written.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum PatternKind {
    /// Literal path, compared byte for byte.
    Exact,
    /// `/`-separated segments where `{name}` matches one non-empty segment.
    Template,
    /// Regular expression that must match the whole path.
    Regex,
}

/// Where a declared handler parameter gets its value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamKind {
    /// `request`: the whole [`Request`](crate::Request).
    Request,
    /// `headers`: the request headers.
    Headers,
    /// `raw_body`: the unparsed body bytes.
    RawBody,
    /// `body`: the body parsed as JSON.
    Body,
    /// `uri_variables`: every variable captured from the path.
    UriVariables,
    /// Any other name: the path variable of the same name.
    Variable,
}

impl ParamKind {
    pub fn of(name: &str) -> Self {
        match name {
            "request"       => Self::Request,
            "headers"       => Self::Headers,
            "raw_body"      => Self::RawBody,
            "body"          => Self::Body,
            "uri_variables" => Self::UriVariables,
            _               => Self::Variable,
        }
    }
}

/// A route declaration: methods, path pattern and parameter names.
#[derive(Clone, Debug)]
pub struct Route {
    pub(crate) kind: PatternKind,
    pub(crate) pattern: String,
    pub(crate) methods: Vec<Method>,
    pub(crate) params: Vec<String>,
}

impl Route {
    /// Literal path. Answers `GET` unless methods are given.
    pub fn exact(path: impl Into<String>) -> Self {
        Self::new(PatternKind::Exact, path.into())
    }

    /// Path with `{name}` segments. Answers `GET` unless methods are given.
    pub fn template(path: impl Into<String>) -> Self {
        Self::new(PatternKind::Template, path.into())
    }

    /// Full-path regular expression. Answers `GET` unless methods are given.
    ///
    /// Named groups are exposed under their name, unnamed groups under their
    /// 1-based index (`"1"`, `"2"`, ...).
    pub fn regex(expr: impl Into<String>) -> Self {
        Self::new(PatternKind::Regex, expr.into())
    }

    pub fn get(path: impl Into<String>) -> Self    { Self::exact(path).method(Method::Get) }
    pub fn post(path: impl Into<String>) -> Self   { Self::exact(path).method(Method::Post) }
    pub fn put(path: impl Into<String>) -> Self    { Self::exact(path).method(Method::Put) }
    pub fn patch(path: impl Into<String>) -> Self  { Self::exact(path).method(Method::Patch) }
    pub fn delete(path: impl Into<String>) -> Self { Self::exact(path).method(Method::Delete) }

    /// Adds a method this route answers.
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn methods(self, methods: impl IntoIterator<Item = Method>) -> Self {
        methods.into_iter().fold(self, Self::method)
    }

    /// Declares the next handler parameter. Order is preserved.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }

    pub fn params<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        names.into_iter().fold(self, |route, name| route.param(name))
    }

    pub fn kind(&self) -> PatternKind { self.kind }
    pub fn pattern(&self) -> &str { &self.pattern }

    /// Declared methods, or `[GET]` when none were given.
    pub(crate) fn effective_methods(&self) -> Vec<Method> {
        if self.methods.is_empty() {
            vec![Method::Get]
        } else {
            self.methods.clone()
        }
    }

    fn new(kind: PatternKind, pattern: String) -> Self {
        Self { kind, pattern, methods: Vec::new(), params: Vec::new() }
    }
}
