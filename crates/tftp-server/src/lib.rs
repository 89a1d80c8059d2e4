//! Lockstep file-transfer server.
//!
//! Accepts connections from a [`tftp_core::Transport`] and serves read and
//! write requests against a [`tftp_core::FileStore`], one connection at a
//! time. Transfer progress is logged through `tracing`.

pub mod error;
pub mod server;
pub mod transport;

pub use error::ServerError;
pub use server::{ConnectionStats, Server, ServerConfig, serve_connection};
pub use transport::TcpTransport;
