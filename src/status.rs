//! HTTP status codes as a typed enum.
//!
//! A [`Response`](crate::Response) stores its status as a plain `u16`, so any
//! code can be sent. [`Status`] names the ones handlers reach for most often
//! and the ones the dispatcher produces itself.
//!
//! ```rust
//! use tsuji::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .header("location", "/users/42")
//!     .json(br#"{"id":42}"#.to_vec());
//! ```

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx ───────────────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201
    Accepted,             // 202
    NoContent,            // 204

    // ── 3xx ───────────────────────────────────────────────────────────────────
    MovedPermanently,     // 301
    Found,                // 302
    SeeOther,             // 303
    NotModified,          // 304
    TemporaryRedirect,    // 307
    PermanentRedirect,    // 308

    // ── 4xx ───────────────────────────────────────────────────────────────────
    BadRequest,           // 400
    Unauthorized,         // 401
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    Conflict,             // 409
    Gone,                 // 410
    UnsupportedMediaType, // 415
    UnprocessableContent, // 422
    TooManyRequests,      // 429

    // ── 5xx ───────────────────────────────────────────────────────────────────
    InternalServerError,  // 500
    NotImplemented,       // 501
    ServiceUnavailable,   // 503
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::Created              => 201,
            Self::Accepted             => 202,
            Self::NoContent            => 204,
            Self::MovedPermanently     => 301,
            Self::Found                => 302,
            Self::SeeOther             => 303,
            Self::NotModified          => 304,
            Self::TemporaryRedirect    => 307,
            Self::PermanentRedirect    => 308,
            Self::BadRequest           => 400,
            Self::Unauthorized         => 401,
            Self::Forbidden            => 403,
            Self::NotFound             => 404,
            Self::MethodNotAllowed     => 405,
            Self::Conflict             => 409,
            Self::Gone                 => 410,
            Self::UnsupportedMediaType => 415,
            Self::UnprocessableContent => 422,
            Self::TooManyRequests      => 429,
            Self::InternalServerError  => 500,
            Self::NotImplemented       => 501,
            Self::ServiceUnavailable   => 503,
        }
    }

    /// Canonical reason phrase, e.g. `"Not Found"`.
    pub fn reason(self) -> &'static str {
        reason_phrase(self.code())
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

/// Reason phrase for an arbitrary numeric code; empty when unregistered.
pub(crate) fn reason_phrase(code: u16) -> &'static str {
    http::StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
