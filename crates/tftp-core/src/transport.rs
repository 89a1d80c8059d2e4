//! Transport abstraction for the listening side.
//!
//! Production binds a real TCP listener; tests bind Turmoil's simulated
//! listener so transfers run under deterministic simulated time.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Source of inbound connections.
///
/// Each accepted stream carries frames for one peer. Requests and transfers
/// on a stream are handled one at a time.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Bidirectional byte stream to one peer.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Accept the next inbound connection.
    ///
    /// Blocks until a peer connects and returns its stream and address.
    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)>;

    /// Address the transport is listening on.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}
