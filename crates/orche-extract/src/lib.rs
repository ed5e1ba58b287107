//! Parameter extraction for Orche.
//!
//! Turns a request into the positional arguments a handler or interceptor
//! unit declared:
//!
//! - [`parse_query`]: query strings into a multimap
//! - [`parse_body`]: bodies into JSON values by content type
//! - [`request_mapper`]: the flattened request facade
//! - [`build_args`]: one slot per binding, filled by kind
//!
//! Values from the path, query and headers are delivered as raw strings.
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use orche_core::{Exchange, NextHandle, Param, RawRequest};
//! use orche_extract::build_args;
//!
//! let mut request = RawRequest::new(Method::GET, "/resource/42");
//! request.params.push("id", "42");
//! let exchange = Exchange::new(request);
//!
//! let bindings = [Param::path("id").at(0)];
//! let args = build_args(Some(&bindings[..]), &exchange, &NextHandle::new()).unwrap();
//! assert_eq!(args.text(0).unwrap(), Some("42"));
//! ```

#![doc(html_root_url = "https://docs.rs/orche-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod body;
mod error;
mod query;

pub use args::{build_args, request_mapper};
pub use body::parse_body;
pub use error::{ExtractionError, ExtractionSource};
pub use query::parse_query;
