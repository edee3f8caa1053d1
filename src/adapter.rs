//! Turns handler replies into responses.

use crate::handler::Reply;
use crate::headers::HttpHeaders;
use crate::response::Response;
use crate::status::Status;

/// A built response passes through; a value becomes a `200` JSON body;
/// an empty reply becomes `204 No Content`.
///
/// File bodies are left untouched: the transport reads the file when it
/// writes the response.
pub(crate) fn into_response(reply: Reply) -> Result<Response, serde_json::Error> {
    match reply {
        Reply::Response(response) => Ok(response),
        Reply::Value(value) => Ok(Response::json(serde_json::to_vec(&value)?)),
        Reply::Empty => Ok(Response::status(Status::NoContent)),
    }
}

/// Appends the server-wide headers. Values the handler set are kept.
pub(crate) fn with_default_headers(mut response: Response, defaults: &HttpHeaders) -> Response {
    response.headers.merge(defaults);
    response
}
