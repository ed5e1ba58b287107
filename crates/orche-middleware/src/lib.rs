//! # Orche Middleware
//!
//! Request processing that runs ahead of route dispatch.
//!
//! ## Pipeline
//!
//! ```text
//! Request → global CORS → InterceptorChain → route layers (CORS wrapper → handler) → 404
//! ```
//!
//! - [`InterceptorChain`] matches interceptors against the request path and
//!   verb, orders them by priority and runs their processing units.
//! - [`Cors`] answers preflight requests and decorates regular responses.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use orche_core::registry::ParameterRegistry;
//! use orche_middleware::InterceptorChain;
//!
//! let chain = InterceptorChain::new(Vec::new(), Arc::new(ParameterRegistry::new()));
//! assert!(chain.is_empty());
//! assert!(chain.matching(&http::Method::GET, "/").is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/orche-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cors;
mod interceptor;

pub use cors::{headers, Cors};
pub use interceptor::InterceptorChain;
