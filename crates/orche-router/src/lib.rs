//! Express-style path patterns for Orche.
//!
//! This crate holds the path-level building blocks shared by the route
//! compiler, the interceptor chain and the reference engine:
//!
//! - [`PathPattern`]: parsed patterns with `:name`, `{name}` and `*` segments
//! - [`Params`]: captured path parameters, kept as raw strings
//! - [`sanitize`] and [`join_paths`]: mount path normalization
//!
//! # Example
//!
//! ```rust
//! use orche_router::{join_paths, PathPattern};
//!
//! let full = join_paths(&["/orche", "computers", ":uuid"]);
//! assert_eq!(full, "/orche/computers/:uuid");
//!
//! let params = PathPattern::parse(&full).matches("/orche/computers/42").unwrap();
//! assert_eq!(params.get("uuid"), Some("42"));
//! ```

#![doc(html_root_url = "https://docs.rs/orche-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod params;
mod path;
mod pattern;

pub use params::Params;
pub use path::{join_paths, sanitize};
pub use pattern::{PathPattern, Segment};
