//! Server error types.

use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Errors that stop the server.
///
/// Transfer failures never surface here; they are logged and the server
/// moves on.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not listen on the requested address
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying failure
        source: io::Error,
    },

    /// Listener failed while waiting for a connection
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// Served directory is missing or not a directory
    #[error("{} is not a directory", .0.display())]
    InvalidRoot(PathBuf),
}
