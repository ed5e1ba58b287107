//! Extraction error types.

use std::fmt;

use orche_core::DispatchError;
use serde_json::Value;

/// Where a value was being extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Path parameters.
    Path,
    /// Query string.
    Query,
    /// Request body.
    Body,
    /// Headers.
    Header,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// A named binding has no name to look up
    Unnamed,
    /// The value could not be decoded
    DeserializationFailed,
    /// Content-Type is unsupported
    UnsupportedMediaType,
    /// A validator rejected the value
    Invalid,
}

/// A failure while filling an argument slot.
///
/// Converted into [`DispatchError::Invalid`] (a 400 envelope with details)
/// when a validator rejected the value, and into
/// [`DispatchError::Extraction`] (a 500 envelope) otherwise.
///
/// ```rust
/// use orche_extract::{ExtractionError, ExtractionSource};
///
/// let err = ExtractionError::deserialization_failed(ExtractionSource::Body, "expected value");
/// assert_eq!(err.extraction_source(), ExtractionSource::Body);
/// assert!(err.to_string().contains("expected value"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    message: String,
    details: Option<Value>,
}

impl ExtractionError {
    /// A path, query or header binding was declared without a name.
    pub fn unnamed(source: ExtractionSource, index: usize) -> Self {
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Unnamed,
            message: format!("{source} binding at index {index} has no parameter name"),
            details: None,
        }
    }

    /// The value could not be decoded.
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to parse {source}: {error}"),
            details: None,
        }
    }

    /// The body has a media type no parser handles.
    pub fn unsupported_media_type(content_type: &str) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::UnsupportedMediaType,
            message: format!("unsupported body content type: {content_type}"),
            details: None,
        }
    }

    /// A validator rejected the value bound from `source`.
    pub fn invalid(source: ExtractionSource, name: Option<&str>, details: Value) -> Self {
        let message = match name {
            Some(name) => format!("invalid {source} parameter `{name}`"),
            None => format!("invalid {source}"),
        };
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Invalid,
            message,
            details: Some(details),
        }
    }

    /// Returns where extraction failed.
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns true for media-type failures.
    pub fn is_unsupported_media_type(&self) -> bool {
        self.kind == ExtractionErrorKind::UnsupportedMediaType
    }

    /// Returns true when a validator rejected the value.
    pub fn is_invalid(&self) -> bool {
        self.kind == ExtractionErrorKind::Invalid
    }

    /// Returns what the validator reported.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExtractionError {}

impl From<ExtractionError> for DispatchError {
    fn from(err: ExtractionError) -> Self {
        match err.details {
            Some(details) => Self::Invalid {
                message: err.message,
                details,
            },
            None => Self::Extraction(err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orche_core::ResponseEnvelope;

    #[test]
    fn test_unnamed_message() {
        let err = ExtractionError::unnamed(ExtractionSource::Query, 2);
        assert_eq!(err.to_string(), "query binding at index 2 has no parameter name");
    }

    #[test]
    fn test_into_dispatch_error() {
        let err: DispatchError = ExtractionError::unsupported_media_type("image/png").into();
        assert_eq!(err.message(), "unsupported body content type: image/png");
        assert_eq!(err.envelope().status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_keeps_details() {
        let err = ExtractionError::invalid(
            ExtractionSource::Query,
            Some("size"),
            serde_json::json!(["must be positive"]),
        );
        assert!(err.is_invalid());
        assert_eq!(err.to_string(), "invalid query parameter `size`");

        let err: DispatchError = err.into();
        assert!(matches!(
            err,
            DispatchError::Invalid { ref details, .. } if details == &serde_json::json!(["must be positive"])
        ));
        assert_eq!(err.envelope().status(), http::StatusCode::BAD_REQUEST);
    }
}
