//! Server error types.

use std::net::SocketAddr;

use orche_core::OrcheError;
use thiserror::Error;

/// Errors raised while serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("Bind error: failed to bind to {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ServerError> for OrcheError {
    fn from(err: ServerError) -> Self {
        Self::configuration(err.to_string())
    }
}
