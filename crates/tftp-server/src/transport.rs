//! TCP transport.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tftp_core::Transport;
use tokio::net::{TcpListener, TcpStream};

use crate::ServerError;

/// [`Transport`] over a tokio TCP listener.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Listen on `addr`.
    pub async fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        let listener =
            TcpListener::bind(addr).await.map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self { listener })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().await?;
        // Frames are small and strictly alternating.
        stream.set_nodelay(true)?;
        Ok((stream, peer))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
