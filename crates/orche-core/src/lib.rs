//! # Orche Core
//!
//! Core types for the Orche routing layer.
//!
//! This crate provides the declarative metadata and per-request types every
//! other Orche crate builds on:
//!
//! - [`Registry`] - Parameter, route and interceptor registries plus the typed builders
//! - [`Exchange`] - One request/response pair and the [`Flow`] decision after each unit
//! - [`Args`] - Positional handler arguments filled from [`ParamBinding`]s
//! - [`Reply`] / [`IntoReply`] - Handler results and response envelopes
//! - [`OrcheError`] / [`DispatchError`] - Fatal and per-request errors

#![doc(html_root_url = "https://docs.rs/orche-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod binding;
mod content;
mod cors;
mod error;
mod exchange;
mod handler;
mod mapper;
mod method;
pub mod registry;
mod response;

pub use args::{Arg, Args, ParamValue};
pub use binding::{Param, ParamBinding, ParamKind, Validator};
pub use content::{is_json, ContentType};
pub use cors::{AllowedOrigins, CorsConfig, CorsOptions, DEFAULT_CORS_METHODS};
pub use error::{DispatchError, OrcheError, OrcheResult};
pub use exchange::{
    Exchange, Flow, NextHandle, QueryMap, RawRequest, RequestHandle, ResponseHandle,
    ResponseState,
};
pub use handler::{callable, BoxFuture, Callable, HandlerResult, Outcome};
pub use mapper::RequestMapper;
pub use method::HttpMethod;
pub use registry::{
    InterceptorBuilder, InterceptorConfig, InterceptorOptions, Processing, Registry,
    RegistryParts, ResourceBuilder, Route, RouteClassConfig, RouteUnit,
};
pub use response::{
    ErrorResponse, GenericResponse, IntoReply, Json, PagedResponse, Reply, ResponseEnvelope,
};

/// Re-exported so handlers can name MIME types without a direct dependency.
pub use mime;
