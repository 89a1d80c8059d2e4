//! Session driver.
//!
//! Executes the actions of a [`Transfer`] against a stream and a file store.
//! The state machine decides; this module only performs the I/O it asks for
//! and reports what happened through an observer callback.

use std::{collections::VecDeque, io, time::Duration};

use bytes::Bytes;
use tftp_proto::{BLOCK_SIZE, Packet, Request};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    FileStore, FrameReader, TransferError, send_packet,
    transfer::{Direction, Transfer, TransferAction, TransferState},
};

/// Default receive deadline.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-transfer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for each peer frame. `None` waits forever.
    pub recv_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { recv_timeout: Some(DEFAULT_RECV_TIMEOUT) }
    }
}

/// Observable steps of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Packet written to the peer
    PacketSent(Packet),
    /// Packet read from the peer
    PacketReceived(Packet),
    /// Transfer state moved
    StateChanged {
        /// Previous state
        from: TransferState,
        /// New state
        to: TransferState,
    },
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSummary {
    /// Which way the file moved
    pub direction: Direction,
    /// Blocks exchanged, including a trailing empty block
    pub blocks: u64,
    /// Payload bytes exchanged
    pub bytes: u64,
}

/// Serve one read or write request to completion.
///
/// Opens the file named by `request`, runs the lockstep exchange over
/// `stream`, and drops the file handle on every exit path. Received blocks are
/// flushed to the file before they are acknowledged.
///
/// # Errors
/// - `FileNotFound` if a read names a missing file
/// - `FileTooLarge` if a read names a file over the block limit
/// - any error from the exchange itself; the transfer is failed and nothing
///   further is sent
pub async fn serve_request<S, F, O>(
    direction: Direction,
    request: &Request,
    stream: &mut S,
    store: &F,
    config: &SessionConfig,
    mut observer: O,
) -> Result<TransferSummary, TransferError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FileStore,
    O: FnMut(&TransferEvent),
{
    let filename = request.filename();
    let (transfer, mut file) = match direction {
        Direction::Read => {
            let (source, size) =
                store.open_read(filename).await.map_err(|err| open_error(err, filename))?;
            (Transfer::read(size)?, FileHandle::Source(source))
        },
        Direction::Write => {
            let sink = store.open_write(filename).await.map_err(|err| open_error(err, filename))?;
            (Transfer::write(), FileHandle::Sink(sink))
        },
    };

    let mut session = Session {
        reported: transfer.state(),
        transfer,
        frames: FrameReader::new(config.recv_timeout),
        observer: &mut observer,
    };
    session.run(stream, &mut file).await
}

fn open_error(err: io::Error, filename: &str) -> TransferError {
    if err.kind() == io::ErrorKind::NotFound {
        TransferError::FileNotFound(filename.to_string())
    } else {
        TransferError::Io(err)
    }
}

struct Session<'o, O> {
    transfer: Transfer,
    /// Last state passed to the observer
    reported: TransferState,
    frames: FrameReader,
    observer: &'o mut O,
}

impl<O> Session<'_, O>
where
    O: FnMut(&TransferEvent),
{
    async fn run<S, R, W>(
        &mut self,
        stream: &mut S,
        file: &mut FileHandle<R, W>,
    ) -> Result<TransferSummary, TransferError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if let Err(err) = self.execute(stream, file).await {
            self.transfer.abort();
            self.report_state();
            return Err(err);
        }

        Ok(TransferSummary {
            direction: self.transfer.direction(),
            blocks: self.transfer.blocks(),
            bytes: self.transfer.bytes(),
        })
    }

    async fn execute<S, R, W>(
        &mut self,
        stream: &mut S,
        file: &mut FileHandle<R, W>,
    ) -> Result<(), TransferError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut pending: VecDeque<TransferAction> = self.transfer.start()?.into();
        self.report_state();

        while let Some(action) = pending.pop_front() {
            match action {
                TransferAction::ReadBlock => {
                    let chunk = file.read_block().await?;
                    let outcome = self.transfer.block_read(chunk);
                    self.report_state();
                    pending.extend(outcome?);
                },
                TransferAction::SendPacket(packet) => {
                    send_packet(stream, &packet).await?;
                    (self.observer)(&TransferEvent::PacketSent(packet));
                },
                TransferAction::WriteBlock(payload) => file.write_block(&payload).await?,
                TransferAction::AwaitPacket => {
                    let packet = self.frames.next_packet(stream).await?;
                    (self.observer)(&TransferEvent::PacketReceived(packet.clone()));
                    let outcome = self.transfer.handle_packet(packet);
                    self.report_state();
                    pending.extend(outcome?);
                },
                TransferAction::Complete => file.finish().await?,
            }
        }

        Ok(())
    }

    fn report_state(&mut self) {
        let current = self.transfer.state();
        if current != self.reported {
            let from = std::mem::replace(&mut self.reported, current);
            (self.observer)(&TransferEvent::StateChanged { from, to: current });
        }
    }
}

/// The file end of a session: a source when serving, a sink when receiving.
enum FileHandle<R, W> {
    Source(R),
    Sink(W),
}

impl<R, W> FileHandle<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Read one block, short only at end of file.
    async fn read_block(&mut self) -> io::Result<Bytes> {
        let Self::Source(source) = self else {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "file opened for writing"));
        };

        let mut block = vec![0u8; BLOCK_SIZE];
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            let n = source.read(&mut block[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        block.truncate(filled);
        Ok(Bytes::from(block))
    }

    /// Append one block and flush it, so the block is stored before it is
    /// acknowledged.
    async fn write_block(&mut self, payload: &[u8]) -> io::Result<()> {
        let Self::Sink(sink) = self else {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "file opened for reading"));
        };
        sink.write_all(payload).await?;
        sink.flush().await
    }

    async fn finish(&mut self) -> io::Result<()> {
        match self {
            Self::Source(_) => Ok(()),
            Self::Sink(sink) => sink.flush().await,
        }
    }
}
