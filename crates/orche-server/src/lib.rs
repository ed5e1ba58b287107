//! Route compilation and serving for Orche.
//!
//! This crate turns frozen registries into mounted routes and serves them:
//!
//! - [`RouteCompiler`] - mounts every route unit on an [`Engine`] and reports what loaded
//! - [`RouteAdapter`] - dispatches one route unit: bind arguments, call, settle
//! - [`Engine`] - what the compiler needs from an HTTP engine
//! - [`HyperEngine`] - the reference engine, on hyper and tokio
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orche_server::{HyperEngine, RouteCompiler};
//!
//! let parts = registry.into_parts()?;
//! let mut engine = HyperEngine::new(config)?;
//! let report = RouteCompiler::new(parts.routes, Arc::new(parts.parameters))
//!     .compile(&mut engine, "/orche");
//! Arc::new(engine).serve().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/orche-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod compiler;
mod dispatcher;
mod engine;
mod error;
mod hyper_engine;

pub use compiler::{BatchReport, LoadedRoute, RouteCompilationReport, RouteCompiler};
pub use dispatcher::RouteAdapter;
pub use engine::{cors_layer, preflight_layer, Engine, Layer, LayerKind, MountedRoute, SubRouter};
pub use error::ServerError;
pub use hyper_engine::{HyperEngine, ResponseBody, ENGINE_NAME, HYPER_VERSION};
