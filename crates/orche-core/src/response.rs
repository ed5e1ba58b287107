//! Handler results and response envelopes.
//!
//! A handler may return anything implementing [`IntoReply`]. The dispatcher
//! then decides, from the [`Reply`], whether to write a response or hand
//! over to the next layer.

use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::DispatchError;

/// A response object that carries its own status.
pub trait ResponseEnvelope {
    /// Status to send.
    fn status(&self) -> StatusCode;

    /// Body to send.
    fn to_body(&self) -> Result<Value, serde_json::Error>;
}

/// What a handler produced, before it is written.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing: continue with the next layer.
    Empty,
    /// A bare value, sent as `200 OK`. `null` counts as empty.
    Value(Value),
    /// A response envelope with its own status.
    Structured {
        /// Status to send.
        status: StatusCode,
        /// Body to send.
        body: Value,
    },
}

impl Reply {
    /// Builds a structured reply from an envelope.
    pub fn from_envelope<E: ResponseEnvelope + ?Sized>(envelope: &E) -> Result<Self, DispatchError> {
        Ok(Self::Structured {
            status: envelope.status(),
            body: envelope.to_body()?,
        })
    }

    /// Returns true if this reply hands over to the next layer.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty) || matches!(self, Self::Value(Value::Null))
    }
}

/// Conversion from handler return values into a [`Reply`].
pub trait IntoReply {
    /// Performs the conversion.
    fn into_reply(self) -> Result<Reply, DispatchError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Ok(Reply::Empty)
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Ok(Reply::Value(self))
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Ok(Reply::Value(Value::String(self)))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Ok(Reply::Value(Value::String(self.to_string())))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        self.map_or(Ok(Reply::Empty), IntoReply::into_reply)
    }
}

/// Any serializable value, sent as `200 OK`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Ok(Reply::Value(serde_json::to_value(self.0)?))
    }
}

/// A body with an explicit status.
///
/// ```rust
/// use http::StatusCode;
/// use orche_core::{GenericResponse, ResponseEnvelope};
///
/// let created = GenericResponse::new(serde_json::json!({"id": 7})).with_status(StatusCode::CREATED);
/// assert_eq!(created.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericResponse<T> {
    body: T,
    status: StatusCode,
}

impl<T> GenericResponse<T> {
    /// Wraps `body` with status `200 OK`.
    pub fn new(body: T) -> Self {
        Self {
            body,
            status: StatusCode::OK,
        }
    }

    /// Overrides the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the wrapped body.
    pub fn body(&self) -> &T {
        &self.body
    }
}

impl<T: Serialize> ResponseEnvelope for GenericResponse<T> {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn to_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.body)
    }
}

impl<T: Serialize> IntoReply for GenericResponse<T> {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Reply::from_envelope(&self)
    }
}

/// The error envelope: `{"message": ..., "details": ..., "status": ...}`.
///
/// `details` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    message: String,
    details: Option<Value>,
    status: StatusCode,
}

impl ErrorResponse {
    /// Creates an error envelope.
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            message: message.into(),
            details: None,
            status,
        }
    }

    /// A `500 Internal Server Error` envelope.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Attaches structured details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ResponseEnvelope for ErrorResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn to_body(&self) -> Result<Value, serde_json::Error> {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(self.message.clone()));
        if let Some(details) = &self.details {
            body.insert("details".into(), details.clone());
        }
        body.insert("status".into(), json!(self.status.as_u16()));
        Ok(Value::Object(body))
    }
}

impl IntoReply for ErrorResponse {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Reply::from_envelope(&self)
    }
}

/// One page of a collection.
///
/// `totalPages` is only computed when both `size` and `totalElements` are
/// positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedResponse<T> {
    items: Vec<T>,
    size: u64,
    page: u64,
    total_elements: u64,
    total_pages: Option<u64>,
    status: StatusCode,
}

impl<T> PagedResponse<T> {
    /// Creates a page with status `200 OK`.
    pub fn new(items: Vec<T>, size: u64, page: u64, total_elements: u64) -> Self {
        let total_pages = (size > 0 && total_elements > 0).then(|| total_elements.div_ceil(size));
        Self {
            items,
            size,
            page,
            total_elements,
            total_pages,
            status: StatusCode::OK,
        }
    }

    /// Overrides the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the number of pages, when known.
    pub fn total_pages(&self) -> Option<u64> {
        self.total_pages
    }
}

impl<T: Serialize> ResponseEnvelope for PagedResponse<T> {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn to_body(&self) -> Result<Value, serde_json::Error> {
        let mut body = Map::new();
        body.insert("data".into(), serde_json::to_value(&self.items)?);
        body.insert("size".into(), json!(self.size));
        body.insert("page".into(), json!(self.page));
        body.insert("totalElements".into(), json!(self.total_elements));
        if let Some(pages) = self.total_pages {
            body.insert("totalPages".into(), json!(pages));
        }
        Ok(Value::Object(body))
    }
}

impl<T: Serialize> IntoReply for PagedResponse<T> {
    fn into_reply(self) -> Result<Reply, DispatchError> {
        Reply::from_envelope(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_and_none_are_empty() {
        assert!(().into_reply().unwrap().is_empty());
        assert!(None::<String>.into_reply().unwrap().is_empty());
        assert!(Value::Null.into_reply().unwrap().is_empty());
        assert!(!json!(0).into_reply().unwrap().is_empty());
    }

    #[test]
    fn test_json_wrapper_serializes() {
        #[derive(Serialize)]
        struct Computer {
            uuid: String,
        }
        let reply = Json(Computer { uuid: "42".into() }).into_reply().unwrap();
        assert_eq!(reply, Reply::Value(json!({"uuid": "42"})));
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorResponse::internal("boom").to_body().unwrap();
        assert_eq!(body, json!({"message": "boom", "status": 500}));

        let body = ErrorResponse::new("bad", StatusCode::BAD_REQUEST)
            .with_details(json!(["name"]))
            .to_body()
            .unwrap();
        assert_eq!(body, json!({"message": "bad", "details": ["name"], "status": 400}));
    }

    #[test]
    fn test_generic_response_keeps_status() {
        let reply = GenericResponse::new(json!({"ok": true}))
            .with_status(StatusCode::CREATED)
            .into_reply()
            .unwrap();
        assert_eq!(
            reply,
            Reply::Structured {
                status: StatusCode::CREATED,
                body: json!({"ok": true})
            }
        );
    }

    #[test]
    fn test_paged_total_pages() {
        assert_eq!(PagedResponse::new(vec![1, 2], 2, 0, 5).total_pages(), Some(3));
        assert_eq!(PagedResponse::new(vec![1, 2], 2, 0, 4).total_pages(), Some(2));
        assert_eq!(PagedResponse::<u8>::new(vec![], 0, 0, 5).total_pages(), None);
        assert_eq!(PagedResponse::<u8>::new(vec![], 10, 0, 0).total_pages(), None);
    }

    #[test]
    fn test_paged_body_omits_unknown_total() {
        let body = PagedResponse::<u8>::new(vec![], 10, 1, 0).to_body().unwrap();
        assert_eq!(
            body,
            json!({"data": [], "size": 10, "page": 1, "totalElements": 0})
        );
    }
}
