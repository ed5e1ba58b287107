//! Positional handler arguments.
//!
//! The dispatcher fills one slot per bound index. Slots nobody bound stay
//! empty. Handlers read slots through typed accessors; asking a slot for
//! the wrong kind is a [`DispatchError`], which the dispatcher turns into a
//! 500 envelope like any other failure.

use std::fmt::Display;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::exchange::{Exchange, NextHandle, RequestHandle, ResponseHandle};
use crate::mapper::RequestMapper;
use crate::DispatchError;

/// A raw string argument taken from the path, query or headers.
///
/// No coercion happens at extraction: `"42"` stays `"42"`. Use
/// [`Args::parse`] for typed access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// The source had no such key.
    #[default]
    Missing,
    /// A single value.
    Text(String),
    /// A key given more than once (query strings only).
    List(Vec<String>),
}

impl ParamValue {
    /// Returns the value, or the first one of a list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Missing => None,
            Self::Text(text) => Some(text),
            Self::List(values) => values.first().map(String::as_str),
        }
    }

    /// Returns true if the source had no such key.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns every value.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Missing => Vec::new(),
            Self::Text(text) => vec![text.clone()],
            Self::List(values) => values.clone(),
        }
    }

    /// Returns the JSON view: `null`, a string or an array of strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Missing => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::List(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        }
    }

    /// Builds a value from the values a key carried.
    pub fn from_values(mut values: Vec<String>) -> Self {
        match values.len() {
            0 => Self::Missing,
            1 => Self::Text(values.remove(0)),
            _ => Self::List(values),
        }
    }
}

impl From<Option<String>> for ParamValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Missing, Self::Text)
    }
}

/// One filled argument slot.
#[derive(Debug, Clone)]
pub enum Arg {
    /// The shared request.
    Request(RequestHandle),
    /// The shared response.
    Response(ResponseHandle),
    /// The continuation handle.
    Next(NextHandle),
    /// A raw path, query or header value.
    Value(ParamValue),
    /// The parsed body (or one field of it).
    Body(Value),
    /// The request-mapper facade.
    Mapper(RequestMapper),
}

impl Arg {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Response(_) => "response",
            Self::Next(_) => "next",
            Self::Value(_) => "value",
            Self::Body(_) => "body",
            Self::Mapper(_) => "mapper",
        }
    }
}

/// The positional argument list of one invocation.
#[derive(Debug, Clone, Default)]
pub struct Args {
    slots: Vec<Option<Arg>>,
}

impl Args {
    /// Creates `len` empty slots.
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// The argument list used when a unit declared no bindings:
    /// `(request, response, next)`.
    pub fn native(exchange: &Exchange, next: &NextHandle) -> Self {
        Self {
            slots: vec![
                Some(Arg::Request(exchange.request().clone())),
                Some(Arg::Response(exchange.response().clone())),
                Some(Arg::Next(next.clone())),
            ],
        }
    }

    /// Fills slot `index`, growing the list if needed.
    pub fn set(&mut self, index: usize, arg: Arg) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(arg);
    }

    /// Returns the number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns slot `index`, if filled.
    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn slot(&self, index: usize) -> Result<&Arg, DispatchError> {
        self.get(index)
            .ok_or(DispatchError::MissingArgument { index })
    }

    fn mismatch(index: usize, expected: &'static str, found: &Arg) -> DispatchError {
        DispatchError::ArgumentKind {
            index,
            expected,
            found: found.kind_name(),
        }
    }

    /// The request handle at `index`.
    pub fn request(&self, index: usize) -> Result<RequestHandle, DispatchError> {
        match self.slot(index)? {
            Arg::Request(handle) => Ok(handle.clone()),
            other => Err(Self::mismatch(index, "request", other)),
        }
    }

    /// The response handle at `index`.
    pub fn response(&self, index: usize) -> Result<ResponseHandle, DispatchError> {
        match self.slot(index)? {
            Arg::Response(handle) => Ok(handle.clone()),
            other => Err(Self::mismatch(index, "response", other)),
        }
    }

    /// The continuation handle at `index`.
    pub fn next(&self, index: usize) -> Result<NextHandle, DispatchError> {
        match self.slot(index)? {
            Arg::Next(handle) => Ok(handle.clone()),
            other => Err(Self::mismatch(index, "next", other)),
        }
    }

    /// The raw value at `index`.
    pub fn value(&self, index: usize) -> Result<&ParamValue, DispatchError> {
        match self.slot(index)? {
            Arg::Value(value) => Ok(value),
            other => Err(Self::mismatch(index, "value", other)),
        }
    }

    /// The raw string at `index`, `None` if the source lacked the key.
    pub fn text(&self, index: usize) -> Result<Option<&str>, DispatchError> {
        self.value(index).map(ParamValue::as_str)
    }

    /// Parses the raw string at `index` into `T`.
    pub fn parse<T>(&self, index: usize) -> Result<Option<T>, DispatchError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.text(index)?
            .map(|raw| {
                raw.parse::<T>().map_err(|err| DispatchError::Conversion {
                    index,
                    message: format!("{raw:?}: {err}"),
                })
            })
            .transpose()
    }

    /// The body value at `index`.
    pub fn body(&self, index: usize) -> Result<&Value, DispatchError> {
        match self.slot(index)? {
            Arg::Body(value) => Ok(value),
            other => Err(Self::mismatch(index, "body", other)),
        }
    }

    /// Deserializes the body value at `index` into `T`.
    pub fn body_as<T: DeserializeOwned>(&self, index: usize) -> Result<T, DispatchError> {
        T::deserialize(self.body(index)?).map_err(|err| DispatchError::Conversion {
            index,
            message: err.to_string(),
        })
    }

    /// The request mapper at `index`.
    pub fn mapper(&self, index: usize) -> Result<&RequestMapper, DispatchError> {
        match self.slot(index)? {
            Arg::Mapper(mapper) => Ok(mapper),
            other => Err(Self::mismatch(index, "mapper", other)),
        }
    }
}
