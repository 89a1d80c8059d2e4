//! Scripted peer.
//!
//! Drives transfers from the requesting side, one packet at a time, so tests
//! can follow the protocol exactly or break it on purpose.

use bytes::Bytes;
use tftp_core::{FrameReader, TransferError, TransferState, send_packet};
use tftp_proto::{Ack, BLOCK_SIZE, BlockId, Data, Mode, Packet, Request};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

/// Requesting side of a connection.
#[derive(Debug)]
pub struct ScriptedClient<S> {
    stream: S,
    frames: FrameReader,
}

impl<S> ScriptedClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream. Receives wait without a deadline; the
    /// simulation bounds the run.
    pub fn new(stream: S) -> Self {
        Self { stream, frames: FrameReader::new(None) }
    }

    /// Send one packet.
    pub async fn send(&mut self, packet: impl Into<Packet>) -> Result<(), TransferError> {
        let packet = packet.into();
        trace!(%packet, "client sending");
        send_packet(&mut self.stream, &packet).await
    }

    /// Receive one packet.
    pub async fn recv(&mut self) -> Result<Packet, TransferError> {
        let packet = self.frames.next_packet(&mut self.stream).await?;
        trace!(%packet, "client received");
        Ok(packet)
    }

    /// Receive a DATA packet, failing on anything else.
    pub async fn recv_data(&mut self) -> Result<Data, TransferError> {
        match self.recv().await? {
            Packet::Data(data) => Ok(data),
            other => Err(unexpected(TransferState::AwaitingData, &other)),
        }
    }

    /// Receive an ACK packet, failing on anything else.
    pub async fn recv_ack(&mut self) -> Result<BlockId, TransferError> {
        match self.recv().await? {
            Packet::Ack(ack) => Ok(ack.block()),
            other => Err(unexpected(TransferState::AwaitingAck, &other)),
        }
    }

    /// Request a file and acknowledge every block, returning the blocks as
    /// received.
    pub async fn get_blocks(&mut self, filename: &str) -> Result<Vec<Data>, TransferError> {
        self.send(Packet::ReadRequest(request(filename)?)).await?;

        let mut blocks = Vec::new();
        let mut expected = BlockId::FIRST;
        loop {
            let data = self.recv_data().await?;
            if data.block() != expected {
                return Err(TransferError::BlockMismatch { expected, actual: data.block() });
            }
            self.send(Ack::new(data.block())).await?;
            expected = expected.next();

            let last = data.is_last_block();
            blocks.push(data);
            if last {
                return Ok(blocks);
            }
        }
    }

    /// Request a file and return its contents.
    pub async fn get(&mut self, filename: &str) -> Result<Vec<u8>, TransferError> {
        let blocks = self.get_blocks(filename).await?;
        Ok(blocks.iter().flat_map(|data| data.payload().iter().copied()).collect())
    }

    /// Upload `contents` under `filename`.
    ///
    /// Waits for `ACK(0)`, then sends block `k` and expects `ACK(k+1)` for
    /// each. Contents that fill their last block get a trailing empty block.
    pub async fn put(&mut self, filename: &str, contents: &[u8]) -> Result<(), TransferError> {
        self.send(Packet::WriteRequest(request(filename)?)).await?;

        let mut block = BlockId::ZERO;
        self.expect_ack(block).await?;

        let mut chunks: Vec<&[u8]> = contents.chunks(BLOCK_SIZE).collect();
        if contents.len() % BLOCK_SIZE == 0 {
            chunks.push(&[]);
        }

        for chunk in chunks {
            self.send(Data::new(block, Bytes::copy_from_slice(chunk))?).await?;
            block = block.next();
            self.expect_ack(block).await?;
        }
        Ok(())
    }

    async fn expect_ack(&mut self, expected: BlockId) -> Result<(), TransferError> {
        let actual = self.recv_ack().await?;
        if actual == expected {
            Ok(())
        } else {
            Err(TransferError::BlockMismatch { expected, actual })
        }
    }

    /// Underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

fn request(filename: &str) -> Result<Request, TransferError> {
    Ok(Request::new(filename, Mode::Octet)?)
}

fn unexpected(state: TransferState, packet: &Packet) -> TransferError {
    TransferError::UnexpectedPacket { state, opcode: packet.opcode() }
}
