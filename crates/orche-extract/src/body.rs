//! Body parsing by content type.

use bytes::Bytes;
use mime::Mime;
use orche_core::is_json;
use serde_json::{Map, Value};

use crate::{ExtractionError, ExtractionSource};

/// Parses a request body into a JSON value.
///
/// | Content type                        | Result                      |
/// |-------------------------------------|-----------------------------|
/// | any, empty body                     | `null`                      |
/// | `application/json`, `*+json`        | the decoded JSON            |
/// | `application/x-www-form-urlencoded` | an object of string values  |
/// | `text/*`                            | a string                    |
/// | none declared                       | JSON if it parses, else text |
///
/// Any other media type is an error.
pub fn parse_body(content_type: Option<&Mime>, body: &Bytes) -> Result<Value, ExtractionError> {
    if body.is_empty() {
        return Ok(Value::Null);
    }

    match content_type {
        Some(mime) if is_json(mime) => serde_json::from_slice(body)
            .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string())),
        Some(mime) if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() => {
            parse_form(body)
        }
        Some(mime) if mime.type_() == mime::TEXT => text(body),
        Some(mime) => Err(ExtractionError::unsupported_media_type(mime.essence_str())),
        None => serde_json::from_slice(body).or_else(|_| text(body)),
    }
}

fn parse_form(body: &Bytes) -> Result<Value, ExtractionError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string()))?;

    let mut object = Map::new();
    for (key, value) in pairs {
        match object.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                object.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(object))
}

fn text(body: &Bytes) -> Result<Value, ExtractionError> {
    std::str::from_utf8(body)
        .map(|s| Value::String(s.to_string()))
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string()))
}
