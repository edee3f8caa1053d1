//! Parameter binding.
//!
//! Every route carries an ordered list of `(name, kind)` pairs resolved at
//! registration. Binding walks that list once per request and produces the
//! [`Args`] the handler is called with. Names are the whole contract:
//!
//! | name            | value                                  |
//! |-----------------|----------------------------------------|
//! | `request`       | the [`Request`]                        |
//! | `headers`       | the request [`HttpHeaders`]            |
//! | `raw_body`      | the body bytes, untouched              |
//! | `body`          | the body parsed as JSON, else `400`    |
//! | `uri_variables` | every variable the path bound          |
//! | anything else   | the single path variable of that name  |

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BindingError, HandlerError};
use crate::headers::HttpHeaders;
use crate::matcher::UriVariables;
use crate::request::Request;
use crate::route::ParamKind;

/// One bound handler argument.
#[derive(Clone, Debug)]
pub enum Arg {
    Request(Request),
    Headers(HttpHeaders),
    RawBody(Bytes),
    Body(Value),
    UriVariables(UriVariables),
    Variable(String),
}

/// The arguments of one handler call, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Args {
    values: Vec<(Arc<str>, Arg)>,
}

impl Args {
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.values.iter().find(|(k, _)| &**k == name).map(|(_, v)| v)
    }

    /// Removes and returns the argument bound to `name`.
    pub fn take(&mut self, name: &str) -> Option<Arg> {
        let i = self.values.iter().position(|(k, _)| &**k == name)?;
        Some(self.values.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arg)> {
        self.values.iter().map(|(k, v)| (&**k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn request(&self) -> Option<&Request> {
        match self.get("request")? {
            Arg::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn headers(&self) -> Option<&HttpHeaders> {
        match self.get("headers")? {
            Arg::Headers(h) => Some(h),
            _ => None,
        }
    }

    pub fn raw_body(&self) -> Option<&Bytes> {
        match self.get("raw_body")? {
            Arg::RawBody(b) => Some(b),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self.get("body")? {
            Arg::Body(v) => Some(v),
            _ => None,
        }
    }

    /// Takes the parsed body out of the arguments.
    pub fn take_body(&mut self) -> Option<Value> {
        match self.take("body")? {
            Arg::Body(v) => Some(v),
            _ => None,
        }
    }

    /// Deserialises the parsed body into `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let body = self
            .body()
            .ok_or_else(|| anyhow::anyhow!("route does not declare a `body` parameter"))?;
        Ok(T::deserialize(body)?)
    }

    pub fn uri_variables(&self) -> Option<&UriVariables> {
        match self.get("uri_variables")? {
            Arg::UriVariables(vars) => Some(vars),
            _ => None,
        }
    }

    /// A single path variable declared as its own parameter.
    pub fn var(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Arg::Variable(v) => Some(v),
            _ => None,
        }
    }
}

/// Builds the handler arguments for one request.
///
/// Fails when a declared name is neither reserved nor bound by the path, or
/// when `body` is declared and the payload is not JSON.
pub(crate) fn bind(
    params: &[(Arc<str>, ParamKind)],
    request: &Request,
    variables: &UriVariables,
) -> Result<Args, BindingError> {
    let mut values = Vec::with_capacity(params.len());

    for (name, kind) in params {
        let arg = match kind {
            ParamKind::Request => Arg::Request(request.clone()),
            ParamKind::Headers => Arg::Headers(request.headers().clone()),
            ParamKind::RawBody => Arg::RawBody(request.body().clone()),
            ParamKind::Body => Arg::Body(parse_body(request.body())?),
            ParamKind::UriVariables => Arg::UriVariables(variables.clone()),
            ParamKind::Variable => match variables.get(&**name) {
                Some(value) => Arg::Variable(value.clone()),
                None => return Err(BindingError::UnresolvableParameter(name.to_string())),
            },
        };
        values.push((Arc::clone(name), arg));
    }

    Ok(Args { values })
}

fn parse_body(body: &Bytes) -> Result<Value, BindingError> {
    serde_json::from_slice(body).map_err(BindingError::MalformedBody)
}
