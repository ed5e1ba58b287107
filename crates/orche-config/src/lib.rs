//! Layered configuration for Orche.
//!
//! This crate resolves the configuration an application runs with from
//! three sources plus defaults, and gates engine construction on the host
//! engine version:
//!
//! - [`OrcheConfig`] - an optional-field draft from code or a file
//! - [`ConfigLoader`] - per-field precedence: environment file > local file > code > default
//! - [`ResolvedConfig`] - the final, sanitized configuration
//! - [`CompatRange`] - supported host engine versions
//!
//! # Configuration File Format
//!
//! The local rc file (`.orcherc`) is a flat JSON object, or TOML when its
//! extension is `.toml`:
//!
//! ```json
//! {
//!   "appName": "computers",
//!   "path": "/orche",
//!   "port": 8080,
//!   "debug": false,
//!   "corsConfig": { "preflight": true, "corsOptions": { "origin": "*" } },
//!   "settings": { "requestTimeoutMs": 30000 },
//!   "initMessage": "computers ready"
//! }
//! ```
//!
//! The environment file, named by the `ORCHE_CONFIG` variable, holds one
//! such object per application name:
//!
//! ```json
//! { "computers": { "port": 9000 } }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use orche_config::{CompatRange, ConfigLoader, OrcheConfig};
//!
//! CompatRange::new("hyper", "1.0.0", "1.x").check("1.6.0").unwrap();
//!
//! let resolution = ConfigLoader::new(OrcheConfig::new().path("/orche")).resolve();
//! assert_eq!(resolution.config.mount_path, "/orche");
//! ```

#![doc(html_root_url = "https://docs.rs/orche-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod compat;
mod config;
mod error;
mod loader;

pub use compat::CompatRange;
pub use config::{ApiEngine, OrcheConfig, ResolvedConfig, Settings, DEFAULT_MOUNT_PATH, DEFAULT_PORT};
pub use error::ConfigFileError;
pub use loader::{ConfigLoader, Resolution, ENV_FILE_VAR, LOCAL_FILE_NAME};
