//! Frame extraction from a byte stream.
//!
//! The stream carries no length prefix. Frame boundaries are recovered from
//! the opcode: DATA and ACK need their 4-byte header, requests end at their
//! second NUL. Each frame is then handed to [`Packet::decode`] whole.

use std::time::Duration;

use tftp_proto::{
    MAX_FRAME_LEN, MAX_REQUEST_FRAME_LEN, Opcode, Packet, ProtocolError, opcodes::OPCODE_LEN,
    packets::BLOCK_HEADER_LEN,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TransferError;

/// Reads one frame at a time from a stream.
///
/// Owns a buffer of [`MAX_FRAME_LEN`] bytes and never reads past the end of
/// an opcode or an ACK, so a request the peer sends right after its final
/// ACK stays in the stream. DATA and request frames have no fixed length and
/// take whatever the stream has buffered; the peer sends nothing after them
/// until it gets an answer.
#[derive(Debug)]
pub struct FrameReader {
    buf: [u8; MAX_FRAME_LEN],
    deadline: Option<Duration>,
}

impl FrameReader {
    /// Create a reader. `deadline` bounds each [`next_packet`](Self::next_packet)
    /// call; `None` waits forever.
    pub fn new(deadline: Option<Duration>) -> Self {
        Self { buf: [0; MAX_FRAME_LEN], deadline }
    }

    /// Receive and decode the next frame.
    ///
    /// # Errors
    /// - `Disconnected` if the peer closed the stream before sending a byte
    /// - `Timeout` if the deadline passed
    /// - `Malformed` if the bytes do not decode
    /// - `Io` on stream failure
    pub async fn next_packet<R>(&mut self, stream: &mut R) -> Result<Packet, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        match self.deadline {
            Some(limit) => tokio::time::timeout(limit, self.read_frame(stream))
                .await
                .map_err(|_| TransferError::Timeout(limit))?,
            None => self.read_frame(stream).await,
        }
    }

    async fn read_frame<R>(&mut self, stream: &mut R) -> Result<Packet, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        let filled = self.fill_to(stream, 0, OPCODE_LEN, OPCODE_LEN).await?;
        let filled = match Packet::peek_opcode(&self.buf[..filled])? {
            Opcode::Ack => self.fill_to(stream, filled, BLOCK_HEADER_LEN, BLOCK_HEADER_LEN).await?,
            Opcode::Data => self.fill_to(stream, filled, BLOCK_HEADER_LEN, MAX_FRAME_LEN).await?,
            Opcode::ReadRequest | Opcode::WriteRequest => {
                self.fill_request(stream, filled).await?
            },
        };

        Ok(Packet::decode(&self.buf[..filled])?)
    }

    /// Read until at least `min` bytes are buffered, never past `limit`.
    async fn fill_to<R>(
        &mut self,
        stream: &mut R,
        mut filled: usize,
        min: usize,
        limit: usize,
    ) -> Result<usize, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        while filled < min {
            let n = stream.read(&mut self.buf[filled..limit]).await?;
            if n == 0 {
                return Err(if filled == 0 {
                    TransferError::Disconnected
                } else {
                    ProtocolError::FrameTooShort { expected: min, actual: filled }.into()
                });
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Read until both request strings are terminated, the request size
    /// limit is reached, or the peer stops sending.
    async fn fill_request<R>(
        &mut self,
        stream: &mut R,
        mut filled: usize,
    ) -> Result<usize, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        while filled < MAX_REQUEST_FRAME_LEN && !self.request_terminated(filled) {
            let n = stream.read(&mut self.buf[filled..MAX_REQUEST_FRAME_LEN]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    fn request_terminated(&self, filled: usize) -> bool {
        self.buf[OPCODE_LEN..filled].iter().filter(|&&b| b == 0).count() >= 2
    }
}

/// Encode `packet` and write it to `stream` as a single frame.
///
/// # Errors
/// `Malformed` if the packet cannot be encoded, `Io` on write failure
pub async fn send_packet<W>(stream: &mut W, packet: &Packet) -> Result<(), TransferError>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; MAX_FRAME_LEN];
    let len = packet.encode(&mut buf)?;
    stream.write_all(&buf[..len]).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use hex_literal::hex;
    use tftp_proto::{Ack, BlockId, Data, Mode, Request};
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn reads_each_packet_kind() {
        let (mut client, mut server) = duplex(4096);
        let mut reader = FrameReader::new(None);

        let packets = [
            Packet::ReadRequest(Request::new("boot.img", Mode::Octet).unwrap()),
            Packet::WriteRequest(Request::new("upload.bin", Mode::NetAscii).unwrap()),
            Data::new(BlockId::new(1), Bytes::from(vec![7u8; 512])).unwrap().into(),
            Data::new(BlockId::new(2), Bytes::new()).unwrap().into(),
            Ack::new(BlockId::new(9)).into(),
        ];

        for packet in packets {
            send_packet(&mut client, &packet).await.unwrap();
            assert_eq!(reader.next_packet(&mut server).await.unwrap(), packet);
        }
    }

    #[tokio::test]
    async fn request_split_across_writes() {
        let (mut client, mut server) = duplex(4096);
        let mut reader = FrameReader::new(None);

        let task = tokio::spawn(async move {
            for part in [&b"\x00"[..], b"\x01fi", b"le\x00oc", b"tet\x00"] {
                client.write_all(part).await.unwrap();
                tokio::task::yield_now().await;
            }
            client
        });

        let packet = reader.next_packet(&mut server).await.unwrap();
        assert_eq!(packet, Packet::ReadRequest(Request::new("file", Mode::Octet).unwrap()));
        drop(task.await.unwrap());
    }

    #[tokio::test]
    async fn ack_header_topped_up() {
        let (mut client, mut server) = duplex(64);
        let mut reader = FrameReader::new(None);

        let task = tokio::spawn(async move {
            client.write_all(&hex!("0004 00")).await.unwrap();
            tokio::task::yield_now().await;
            client.write_all(&hex!("05")).await.unwrap();
            client
        });

        assert_eq!(reader.next_packet(&mut server).await.unwrap(), Ack::new(BlockId::new(5)).into());
        drop(task.await.unwrap());
    }

    #[tokio::test]
    async fn ack_does_not_swallow_following_request() {
        let (mut client, mut server) = duplex(4096);
        let rrq = Packet::ReadRequest(Request::new("next.bin", Mode::Octet).unwrap());
        send_packet(&mut client, &Ack::new(BlockId::new(2)).into()).await.unwrap();
        send_packet(&mut client, &rrq).await.unwrap();

        let mut reader = FrameReader::new(None);
        assert_eq!(reader.next_packet(&mut server).await.unwrap(), Ack::new(BlockId::new(2)).into());
        assert_eq!(reader.next_packet(&mut server).await.unwrap(), rrq);
    }

    #[tokio::test]
    async fn clean_close_is_disconnect() {
        let (client, mut server) = duplex(64);
        drop(client);
        let mut reader = FrameReader::new(None);
        assert!(matches!(reader.next_packet(&mut server).await, Err(TransferError::Disconnected)));
    }

    #[tokio::test]
    async fn close_inside_header_is_malformed() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&hex!("0004 00")).await.unwrap();
        drop(client);

        let mut reader = FrameReader::new(None);
        assert!(matches!(
            reader.next_packet(&mut server).await,
            Err(TransferError::Malformed(ProtocolError::FrameTooShort { expected: 4, actual: 3 }))
        ));
    }

    #[tokio::test]
    async fn unknown_opcode_reported_immediately() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&hex!("0005")).await.unwrap();

        let mut reader = FrameReader::new(None);
        assert!(matches!(
            reader.next_packet(&mut server).await,
            Err(TransferError::Malformed(ProtocolError::UnknownOpcode(5)))
        ));
        drop(client);
    }

    #[tokio::test]
    async fn oversized_request_rejected() {
        let (mut client, mut server) = duplex(4096);
        let mut frame = vec![0x00, 0x01];
        frame.extend(std::iter::repeat_n(b'a', 600));
        client.write_all(&frame).await.unwrap();

        let mut reader = FrameReader::new(None);
        assert!(matches!(reader.next_packet(&mut server).await, Err(TransferError::Malformed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_times_out() {
        let (_client, mut server) = duplex(64);
        let mut reader = FrameReader::new(Some(Duration::from_secs(5)));
        assert!(matches!(
            reader.next_packet(&mut server).await,
            Err(TransferError::Timeout(limit)) if limit == Duration::from_secs(5)
        ));
    }
}
