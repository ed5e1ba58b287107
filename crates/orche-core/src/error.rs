//! Error types for Orche.
//!
//! Two families of errors exist:
//!
//! - [`OrcheError`]: fatal problems detected while assembling an application
//!   (bad registrations, incompatible host engine). These abort bootstrap.
//! - [`DispatchError`]: anything that goes wrong while serving one request.
//!   These never escape the dispatcher; they are turned into a JSON error
//!   envelope (see [`DispatchError::envelope`]), `400` for rejected
//!   parameters and `500` for everything else.

use std::any::Any;

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::ErrorResponse;

/// Result type alias using [`OrcheError`].
pub type OrcheResult<T> = Result<T, OrcheError>;

/// Fatal configuration-time error.
///
/// # Example
///
/// ```
/// use orche_core::OrcheError;
///
/// let err = OrcheError::unknown_class("Computers");
/// assert!(err.to_string().contains("Computers"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrcheError {
    /// The registrations or resolved configuration are inconsistent.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// The host engine version is outside the supported range.
    #[error(
        "Engine version not supported. For {dependency} you should use a version from {from} to {to} (found {found})"
    )]
    IncompatibleEngine {
        /// Name of the host engine dependency.
        dependency: String,
        /// Lowest supported version.
        from: String,
        /// Highest supported version (may be a wildcard like `1.x`).
        to: String,
        /// Version actually linked.
        found: String,
    },
}

impl OrcheError {
    /// Creates a configuration error with a message.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// A route unit was registered for a class that never registered a prefix.
    #[must_use]
    pub fn unknown_class(class_name: &str) -> Self {
        Self::configuration(format!(
            "route unit registered for `{class_name}`, which has no route configuration"
        ))
    }
}

/// Per-request failure inside the dispatcher or the interceptor chain.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A parameter could not be extracted from the request.
    #[error("{0}")]
    Extraction(String),

    /// A parameter validator rejected the extracted value.
    #[error("{message}")]
    Invalid {
        /// Which parameter was rejected.
        message: String,
        /// What the validator reported.
        details: Value,
    },

    /// A handler asked for an argument slot that holds something else.
    #[error("argument {index} is {found}, not {expected}")]
    ArgumentKind {
        /// Positional index that was accessed.
        index: usize,
        /// What the handler asked for.
        expected: &'static str,
        /// What the slot actually holds.
        found: &'static str,
    },

    /// A handler asked for an argument slot that nothing was bound to.
    #[error("no argument bound at index {index}")]
    MissingArgument {
        /// Positional index that was accessed.
        index: usize,
    },

    /// A raw string argument failed typed conversion.
    #[error("argument {index} could not be converted: {message}")]
    Conversion {
        /// Positional index that was converted.
        index: usize,
        /// Conversion failure.
        message: String,
    },

    /// The handler returned an error.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    /// The handler result could not be serialized.
    #[error("response serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl DispatchError {
    /// Builds a [`DispatchError::Panic`] from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::Panic(message)
    }

    /// Returns the message placed into the error envelope.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns the error envelope written for this error.
    pub fn envelope(&self) -> ErrorResponse {
        match self {
            Self::Invalid { message, details } => {
                ErrorResponse::new(message.clone(), StatusCode::BAD_REQUEST).with_details(details.clone())
            }
            other => ErrorResponse::internal(other.message()),
        }
    }
}
