//! Parameter bindings: where each positional argument comes from.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The source of one handler argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKind {
    /// The shared request handle.
    RawRequest,
    /// The shared response handle.
    RawResponse,
    /// The continuation handle.
    NextHandle,
    /// A named path parameter.
    PathParam,
    /// A named query parameter.
    QueryParam,
    /// The parsed body, or one field of it when named.
    BodyParam,
    /// A named header.
    HeaderParam,
    /// The request-mapper facade.
    RequestMapper,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RawRequest => "request",
            Self::RawResponse => "response",
            Self::NextHandle => "next",
            Self::PathParam => "path",
            Self::QueryParam => "query",
            Self::BodyParam => "body",
            Self::HeaderParam => "header",
            Self::RequestMapper => "mapper",
        })
    }
}

/// A check run on an extracted value before the unit is invoked.
///
/// The check sees the JSON view of the argument: `null` when the source had
/// no such key, a string, an array for repeated query keys, or the body
/// value. Returning `Err(details)` answers `400` with `details` in the
/// error envelope and the unit is not invoked.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&Value) -> Result<(), Value> + Send + Sync>);

impl Validator {
    /// Wraps a check.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Runs the check.
    pub fn check(&self, value: &Value) -> Result<(), Value> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Validator {}

/// A binding declaration before it is attached to an index.
///
/// ```rust
/// use orche_core::{Param, ParamKind};
/// use serde_json::json;
///
/// let p = Param::path("uuid");
/// assert_eq!(p.kind(), ParamKind::PathParam);
/// assert_eq!(p.name(), Some("uuid"));
///
/// let size = Param::query("size").validate(|v| match v.as_str() {
///     Some(s) if s.parse::<u32>().is_ok() => Ok(()),
///     _ => Err(json!({ "size": "expected a positive number" })),
/// });
/// assert!(size.validator().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    kind: ParamKind,
    name: Option<String>,
    validator: Option<Validator>,
}

impl Param {
    /// Binds any kind with an optional source name.
    pub fn new(kind: ParamKind, name: Option<String>) -> Self {
        Self {
            kind,
            name,
            validator: None,
        }
    }

    /// Attaches a validator. Only value-carrying kinds (path, query,
    /// header, body) are checked; handles and the mapper ignore it.
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        self.validator = Some(Validator::new(check));
        self
    }

    /// The raw request.
    pub fn request() -> Self {
        Self::new(ParamKind::RawRequest, None)
    }

    /// The raw response.
    pub fn response() -> Self {
        Self::new(ParamKind::RawResponse, None)
    }

    /// The continuation handle.
    pub fn next() -> Self {
        Self::new(ParamKind::NextHandle, None)
    }

    /// A path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(ParamKind::PathParam, Some(name.into()))
    }

    /// A query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(ParamKind::QueryParam, Some(name.into()))
    }

    /// A header.
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(ParamKind::HeaderParam, Some(name.into()))
    }

    /// The whole parsed body.
    pub fn body() -> Self {
        Self::new(ParamKind::BodyParam, None)
    }

    /// One top-level field of the parsed body.
    pub fn body_field(name: impl Into<String>) -> Self {
        Self::new(ParamKind::BodyParam, Some(name.into()))
    }

    /// The request-mapper facade.
    pub fn mapper() -> Self {
        Self::new(ParamKind::RequestMapper, None)
    }

    /// Returns the kind.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Returns the source name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the validator, if any.
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Attaches the binding to a positional index.
    pub fn at(self, index: usize) -> ParamBinding {
        ParamBinding {
            kind: self.kind,
            name: self.name,
            index,
            validator: self.validator,
        }
    }
}

/// A binding at a positional index of a handler or interceptor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBinding {
    /// Where the value comes from.
    pub kind: ParamKind,
    /// Key in the source (path/query/header name, body field).
    pub name: Option<String>,
    /// Position in the argument list.
    pub index: usize,
    /// Optional check on the extracted value.
    #[serde(skip)]
    pub validator: Option<Validator>,
}

impl ParamBinding {
    /// A binding without a validator.
    pub fn new(kind: ParamKind, name: Option<String>, index: usize) -> Self {
        Self {
            kind,
            name,
            index,
            validator: None,
        }
    }
}
