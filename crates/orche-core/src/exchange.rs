//! Per-request state shared between interceptors and handlers.
//!
//! An [`Exchange`] owns one request and one response. Both are behind
//! shared handles so the same request can be seen (and mutated) by every
//! interceptor unit and by the route handler, and so a handler bound to the
//! raw response can write to it directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use indexmap::IndexMap;
use mime::Mime;
use orche_router::Params;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Serialize;
use serde_json::Value;

use crate::response::{ErrorResponse, Reply, ResponseEnvelope};
use crate::DispatchError;

/// Query string values by key, in first-seen order.
pub type QueryMap = IndexMap<String, Vec<String>>;

/// The incoming request as handlers see it.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Request method.
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// Parsed query string. A key given several times keeps every value.
    pub query: QueryMap,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Bytes,
    /// Path parameters captured by the route layer currently executing.
    pub params: Params,
}

impl RawRequest {
    /// Creates a request with no headers, query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Inserts or replaces a header. Invalid names or values are ignored.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
    }

    /// Returns the first query value for `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Replaces every query value for `name` with `value`.
    pub fn set_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.insert(name.into(), vec![value.into()]);
    }

    /// Returns the declared body media type.
    pub fn content_type(&self) -> Option<Mime> {
        self.header(CONTENT_TYPE.as_str())
            .and_then(|v| v.parse().ok())
    }
}

/// Shared handle to the request of an exchange.
#[derive(Debug, Clone)]
pub struct RequestHandle(Arc<RwLock<RawRequest>>);

impl RequestHandle {
    /// Wraps a request.
    pub fn new(request: RawRequest) -> Self {
        Self(Arc::new(RwLock::new(request)))
    }

    /// Locks the request for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, RawRequest> {
        self.0.read()
    }

    /// Locks the request for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, RawRequest> {
        self.0.write()
    }
}

/// The response being assembled for an exchange.
#[derive(Debug, Clone)]
pub struct ResponseState {
    /// Status to send.
    pub status: StatusCode,
    /// Headers to send.
    pub headers: HeaderMap,
    /// Body to send.
    pub body: Bytes,
    /// Set once something sent a body; later sends are ignored.
    pub sent: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }
}

/// Shared handle to the response of an exchange.
///
/// Mirrors the small surface handlers usually need from a raw response:
/// set a status, set headers, send a body once.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle(Arc<Mutex<ResponseState>>);

impl ResponseHandle {
    /// Creates an unsent `200 OK` response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the response state.
    pub fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.0.lock()
    }

    /// Sets the status code.
    pub fn status(&self, status: StatusCode) -> &Self {
        self.0.lock().status = status;
        self
    }

    /// Sets a header. Invalid names or values are ignored.
    pub fn header(&self, name: &str, value: &str) -> &Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.0.lock().headers.insert(name, value);
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(&self, mime: &Mime) -> &Self {
        self.header(CONTENT_TYPE.as_str(), mime.as_ref())
    }

    /// Sends `body` with the current status and headers.
    ///
    /// Returns false (and leaves the response untouched) if a body was
    /// already sent.
    pub fn send(&self, body: impl Into<Bytes>) -> bool {
        let mut state = self.0.lock();
        if state.sent {
            tracing::warn!(status = %state.status, "response already sent, ignoring second send");
            return false;
        }
        state.body = body.into();
        state.sent = true;
        true
    }

    /// Sends a plain-text body.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        if !self.0.lock().headers.contains_key(CONTENT_TYPE) {
            self.content_type(&mime::TEXT_PLAIN_UTF_8);
        }
        self.send(text.into())
    }

    /// Serializes `value` as JSON and sends it.
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.content_type(&mime::APPLICATION_JSON);
        Ok(self.send(body))
    }

    /// Returns true once a body has been sent.
    pub fn is_sent(&self) -> bool {
        self.0.lock().sent
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> ResponseState {
        self.0.lock().clone()
    }

    /// Writes `value` with `status` using the declared media type.
    ///
    /// Strings go out verbatim; every other value is encoded as JSON.
    pub(crate) fn write_value(&self, status: StatusCode, value: &Value, mime: &Mime) -> bool {
        let body = match value {
            Value::String(text) => Bytes::from(text.clone()),
            other => match serde_json::to_vec(other) {
                Ok(bytes) => Bytes::from(bytes),
                Err(err) => {
                    tracing::error!(error = %err, "failed to encode response body");
                    return self.write_error(&ErrorResponse::internal(err.to_string()));
                }
            },
        };
        self.status(status).content_type(mime);
        self.send(body)
    }

    /// Writes the JSON error envelope with the envelope's status.
    ///
    /// Returns false if a body was already sent.
    pub fn write_error(&self, error: &ErrorResponse) -> bool {
        let body = error
            .to_body()
            .ok()
            .and_then(|value| serde_json::to_vec(&value).ok())
            .unwrap_or_else(|| br#"{"message":"internal error","status":500}"#.to_vec());
        self.status(error.status()).content_type(&mime::APPLICATION_JSON);
        self.send(body)
    }
}

/// The continuation handle handed to handlers bound to `next`.
///
/// Calling it records that the unit explicitly yielded to the next layer.
#[derive(Debug, Clone, Default)]
pub struct NextHandle(Arc<AtomicBool>);

impl NextHandle {
    /// Creates an uncalled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Yields to the next interceptor unit or route layer.
    pub fn call(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if [`call`](Self::call) was invoked.
    pub fn was_called(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the pipeline should do after a unit has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// A response was written; stop here.
    Responded,
    /// Nothing was written; continue with the next unit or layer.
    Next,
}

/// One request/response pair moving through the pipeline.
#[derive(Debug, Clone)]
pub struct Exchange {
    request: RequestHandle,
    response: ResponseHandle,
}

impl Exchange {
    /// Starts an exchange for `request`.
    pub fn new(request: RawRequest) -> Self {
        Self {
            request: RequestHandle::new(request),
            response: ResponseHandle::new(),
        }
    }

    /// Returns the shared request handle.
    pub fn request(&self) -> &RequestHandle {
        &self.request
    }

    /// Returns the shared response handle.
    pub fn response(&self) -> &ResponseHandle {
        &self.response
    }

    /// Turns a unit outcome into a pipeline decision.
    ///
    /// - if the unit already sent a response, the exchange is done
    /// - a non-empty reply is written with `mime` (its own status for
    ///   structured replies, `200` otherwise)
    /// - an empty reply continues the pipeline
    /// - an error is written as its JSON envelope (400 for rejected
    ///   parameters, 500 otherwise)
    pub fn settle(&self, outcome: Result<Reply, DispatchError>, mime: &Mime) -> Flow {
        match outcome {
            Err(err) => {
                if self.response.is_sent() {
                    tracing::error!(error = %err, "unit failed after sending a response");
                } else {
                    self.response.write_error(&err.envelope());
                }
                Flow::Responded
            }
            Ok(_) if self.response.is_sent() => Flow::Responded,
            Ok(Reply::Empty) => Flow::Next,
            Ok(Reply::Value(value)) if value.is_null() => Flow::Next,
            Ok(Reply::Value(value)) => {
                self.response.write_value(StatusCode::OK, &value, mime);
                Flow::Responded
            }
            Ok(Reply::Structured { status, body }) => {
                self.response.write_value(status, &body, mime);
                Flow::Responded
            }
        }
    }

    /// Consumes the exchange, returning the final response state.
    pub fn into_response(self) -> ResponseState {
        self.response.snapshot()
    }
}
