//! Accept loop and per-connection dispatch.
//!
//! Connections are served one at a time. On each connection the server reads
//! standalone frames: a read request starts a read session, a write request
//! starts a write session, and anything else is logged and skipped.

use std::{net::SocketAddr, time::Duration};

use tftp_core::{
    Direction, FileStore, FrameReader, SessionConfig, TransferError, TransferEvent, Transport,
    serve_request,
};
use tftp_proto::{Packet, Request};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::ServerError;

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Settings applied to every transfer
    pub session: SessionConfig,
    /// Close the connection after a failed transfer
    pub close_on_failure: bool,
    /// How long an idle connection may wait for its next request.
    /// `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { session: SessionConfig::default(), close_on_failure: true, idle_timeout: None }
    }
}

/// Transfer counts for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Transfers that ran to completion
    pub completed: u64,
    /// Transfers that ended in an error
    pub failed: u64,
    /// Frames that were malformed or arrived outside a transfer
    pub ignored: u64,
}

/// Sequential transfer server.
#[derive(Debug)]
pub struct Server<T, F> {
    transport: T,
    store: F,
    config: ServerConfig,
}

impl<T, F> Server<T, F>
where
    T: Transport,
    F: FileStore,
{
    /// Create a server accepting from `transport` and serving files from
    /// `store`.
    pub fn new(transport: T, store: F, config: ServerConfig) -> Self {
        Self { transport, store, config }
    }

    /// File store being served.
    pub fn store(&self) -> &F {
        &self.store
    }

    /// Accept and serve connections until the listener fails.
    pub async fn run(&self) -> Result<(), ServerError> {
        match self.transport.local_addr() {
            Ok(addr) => info!(%addr, "server started"),
            Err(err) => warn!(%err, "server started on unknown address"),
        }

        loop {
            let (stream, peer) = self.transport.accept().await.map_err(|err| {
                error!(%err, "accept failed");
                ServerError::Accept(err)
            })?;

            info!(%peer, "client connected");
            let stats = serve_connection(stream, peer, &self.store, &self.config).await;
            info!(
                %peer,
                completed = stats.completed,
                failed = stats.failed,
                ignored = stats.ignored,
                "client disconnected"
            );
        }
    }
}

/// Serve requests on one connection until the peer leaves.
///
/// The connection also ends after a failed transfer when
/// [`ServerConfig::close_on_failure`] is set, and after a disconnect or
/// stream failure in any case.
pub async fn serve_connection<S, F>(
    mut stream: S,
    peer: SocketAddr,
    store: &F,
    config: &ServerConfig,
) -> ConnectionStats
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FileStore,
{
    let mut frames = FrameReader::new(config.idle_timeout);
    let mut stats = ConnectionStats::default();

    loop {
        let packet = match frames.next_packet(&mut stream).await {
            Ok(packet) => packet,
            Err(TransferError::Disconnected) => break,
            Err(TransferError::Malformed(err)) => {
                warn!(%peer, %err, "dropping malformed frame");
                stats.ignored += 1;
                continue;
            },
            Err(err) => {
                warn!(%peer, %err, "closing connection");
                break;
            },
        };

        let (direction, request) = match packet {
            Packet::ReadRequest(request) => (Direction::Read, request),
            Packet::WriteRequest(request) => (Direction::Write, request),
            other => {
                warn!(%peer, packet = %other, "ignoring packet outside a transfer");
                stats.ignored += 1;
                continue;
            },
        };

        if let Err(err) = transfer(direction, &request, &mut stream, peer, store, config).await {
            stats.failed += 1;
            if config.close_on_failure || matches!(err, TransferError::Disconnected) {
                break;
            }
        } else {
            stats.completed += 1;
        }
    }

    stats
}

async fn transfer<S, F>(
    direction: Direction,
    request: &Request,
    stream: &mut S,
    peer: SocketAddr,
    store: &F,
    config: &ServerConfig,
) -> Result<(), TransferError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FileStore,
{
    let file = request.filename();
    match direction {
        Direction::Read => info!(%peer, file, mode = %request.mode(), "sending file"),
        Direction::Write => info!(%peer, file, mode = %request.mode(), "receiving file"),
    }

    let observer = |event: &TransferEvent| match event {
        TransferEvent::PacketSent(packet) => debug!(%peer, %packet, "sent"),
        TransferEvent::PacketReceived(packet) => debug!(%peer, %packet, "received"),
        TransferEvent::StateChanged { from, to } => debug!(%peer, ?from, ?to, "state changed"),
    };

    match serve_request(direction, request, stream, store, &config.session, observer).await {
        Ok(summary) => {
            info!(%peer, file, blocks = summary.blocks, bytes = summary.bytes, "transfer complete");
            Ok(())
        },
        Err(err) => {
            warn!(%peer, file, %err, "transfer failed");
            Err(err)
        },
    }
}
