//! Turmoil transport.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tftp_core::Transport;
use turmoil::net::{TcpListener, TcpStream};

/// [`Transport`] over Turmoil's simulated TCP.
///
/// Only usable inside a Turmoil host.
pub struct SimTransport {
    listener: TcpListener,
}

impl std::fmt::Debug for SimTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimTransport").finish_non_exhaustive()
    }
}

impl SimTransport {
    /// Listen on `addr` inside the current simulated host.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self { listener: TcpListener::bind(addr).await? })
    }

    /// Connect to `addr` (`"host:port"`) from the current simulated host.
    pub async fn connect_to(addr: &str) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }
}

#[async_trait]
impl Transport for SimTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
