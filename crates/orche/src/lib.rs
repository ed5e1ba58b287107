//! # Orche
//!
//! **Declarative HTTP routing with registries, interceptors and layered configuration**
//!
//! Orche lets an application declare resources and interceptors as metadata,
//! then compiles that metadata onto an HTTP engine:
//!
//! - **Registries** - route units, positional parameter bindings and interceptors
//! - **Route compiler** - mounts every declared unit, reporting anything it skipped
//! - **Dispatcher** - binds arguments by kind, runs the handler, writes or falls through
//! - **Interceptor chain** - ordered, path and verb filtered units run before routes
//! - **Layered configuration** - environment file over `.orcherc` over code over defaults
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orche::prelude::*;
//!
//! #[derive(Default)]
//! struct Computers;
//!
//! impl Computers {
//!     async fn read(self, args: Args) -> HandlerResult<String> {
//!         Ok(format!("computer {}", args.text(0)?.unwrap_or_default()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> OrcheResult<()> {
//!     let mut registry = Registry::new();
//!     registry
//!         .resource::<Computers>("computers")
//!         .route(Route::get(":uuid", "read", Computers::read).bind(0, Param::path("uuid")));
//!
//!     let app = Orche::init(registry, OrcheConfig::new().path("orche").port(3001))?;
//!     app.run().await
//! }
//! ```
//!
//! ## Request pipeline
//!
//! ```text
//! Request → app CORS → interceptors → route layers (preflight, CORS, handler) → 404
//! ```

#![doc(html_root_url = "https://docs.rs/orche/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::{App, Orche};

// Re-export core types
pub use orche_core as core;

// Re-export server types
pub use orche_server as server;

// Re-export middleware types
pub use orche_middleware as middleware;

// Re-export router types
pub use orche_router as router;

// Re-export extraction types
pub use orche_extract as extract;

// Re-export configuration types
pub use orche_config as config;

// Re-export logging setup
pub use orche_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use orche::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, Orche};

    pub use orche_core::{
        Args, ContentType, CorsConfig, CorsOptions, HandlerResult, HttpMethod,
        InterceptorOptions, OrcheError, OrcheResult, Param, Processing, Registry, Route,
    };

    // Re-export response builders
    pub use orche_core::{ErrorResponse, GenericResponse, IntoReply, Json, PagedResponse, Reply};

    pub use orche_config::{ApiEngine, OrcheConfig};

    pub use orche_server::RouteCompilationReport;
}
