//! Structured logging for Orche.
//!
//! JSON output is the default. Applications resolved with `debug: true`
//! use the development preset: `debug` level and human-readable output.
//!
//! # Example
//!
//! ```rust,ignore
//! use orche_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::for_app("computers", false))?;
//! tracing::info!(orche.class = "Computers", "routes loaded");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Install nothing when false.
    pub enabled: bool,

    /// Filter directives (e.g., "info", "orche_server=debug,hyper=warn").
    pub level: String,

    /// One JSON object per event instead of the pretty multi-line format.
    pub json_format: bool,

    /// Log span creation and close.
    pub span_events: bool,

    /// Record source file and line of each event.
    pub file_line_info: bool,

    /// Record the emitting module path.
    pub include_target: bool,

    /// Application name, recorded once logging starts.
    pub app_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
            app_name: "orche".to_string(),
        }
    }
}

impl LogConfig {
    /// The `debug: true` preset: debug level, pretty output, source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Picks the preset for an application's debug flag.
    #[must_use]
    pub fn for_app(app_name: impl Into<String>, debug: bool) -> Self {
        let base = if debug { Self::development() } else { Self::default() };
        Self {
            app_name: app_name.into(),
            ..base
        }
    }
}

/// Initializes the global logging subscriber.
///
/// `RUST_LOG`, when set, overrides [`LogConfig::level`].
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for bad directives and
/// `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => create_env_filter(&directives)?,
        _ => create_env_filter(&config.level)?,
    };

    let spans = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let base = tracing_subscriber::fmt::layer()
        .with_span_events(spans)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);
    let output: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
        base.json().boxed()
    } else {
        base.pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(app = %config.app_name, json = config.json_format, "logging initialized");
    Ok(())
}

/// Parses `RUST_LOG`-style directives.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}

/// Emits the per-request summary event at `info`.
#[macro_export]
macro_rules! log_request_complete {
    ($method:expr, $path:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            http.method = %$method,
            http.path = %$path,
            http.status_code = $status,
            duration_ms = $duration_ms,
            "request completed"
        );
    };
}

/// Emits a request rejected before reaching the pipeline, at `warn`.
#[macro_export]
macro_rules! log_request_error {
    ($method:expr, $path:expr, $error:expr) => {
        tracing::warn!(
            http.method = %$method,
            http.path = %$path,
            error = %$error,
            "request rejected"
        );
    };
}
