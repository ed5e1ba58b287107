//! Logging for Orche.
//!
//! Orche logs through [`tracing`] with structured fields. This crate sets up
//! the subscriber an application writes to:
//!
//! - [`LogConfig`] - level, format and presets
//! - [`init_logging`] - installs a JSON or pretty `fmt` layer behind an `EnvFilter`
//!
//! # Example
//!
//! ```rust,ignore
//! use orche_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! ```

#![doc(html_root_url = "https://docs.rs/orche-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
