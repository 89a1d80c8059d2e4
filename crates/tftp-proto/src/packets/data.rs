use std::fmt;

use bytes::Bytes;

use super::{BLOCK_HEADER_LEN, BlockHeader, MAX_DATA_FRAME_LEN, WirePacket, check_frame_len};
use crate::{BLOCK_SIZE, BlockId, Opcode, ProtocolError, Reader, Result, Writer, is_last_block};

/// One block of file payload.
///
/// A payload of exactly [`BLOCK_SIZE`] bytes means more blocks follow; any
/// shorter payload, including an empty one, ends the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Data {
    block: BlockId,
    payload: Bytes,
}

impl Data {
    /// Build a data packet, rejecting payloads larger than one block.
    pub fn new(block: BlockId, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > BLOCK_SIZE {
            return Err(ProtocolError::PayloadTooLarge { actual: payload.len(), max: BLOCK_SIZE });
        }
        Ok(Self { block, payload })
    }

    /// Parse a DATA frame without copying the payload.
    ///
    /// The returned slice borrows `raw`; [`WirePacket::try_parse`] copies it
    /// into an owned packet.
    pub fn parse_view(raw: &[u8]) -> Result<(BlockId, &[u8])> {
        check_frame_len(raw, BLOCK_HEADER_LEN, MAX_DATA_FRAME_LEN)?;
        let mut reader = Reader::new(raw);
        let header: &BlockHeader = reader.read_as()?;
        header.expect_opcode(Opcode::Data)?;
        let payload = reader.remaining();
        reader.skip(payload.len());
        Ok((header.block(), payload))
    }

    /// Block id.
    pub const fn block(&self) -> BlockId {
        self.block
    }

    /// Payload bytes.
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether this block ends the transfer.
    pub fn is_last_block(&self) -> bool {
        is_last_block(self.payload.len())
    }

    /// Take the payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

impl WirePacket for Data {
    const OPCODE: Opcode = Opcode::Data;

    fn try_parse(raw: &[u8]) -> Result<Self> {
        let (block, payload) = Self::parse_view(raw)?;
        Ok(Self { block, payload: Bytes::copy_from_slice(payload) })
    }

    fn encoded_len(&self) -> usize {
        BLOCK_HEADER_LEN + self.payload.len()
    }

    fn encode_into(&self, writer: &mut Writer<'_>) -> Result<()> {
        if writer.available() < self.encoded_len() {
            return Err(ProtocolError::BufferTooSmall {
                needed: self.encoded_len(),
                available: writer.available(),
            });
        }
        writer.write_as(&BlockHeader::new(Self::OPCODE, self.block))?;
        writer.write_all(&self.payload)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DATA({}, <{} bytes>)", self.block, self.payload.len())
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn wire_layout() {
        let data = Data::new(BlockId::new(2), &b"hi"[..]).unwrap();
        assert_eq!(data.to_bytes().unwrap().as_ref(), hex!("0003 0002 6869"));
        assert_eq!(Data::try_parse(&hex!("0003 0002 6869")), Ok(data));
    }

    #[test]
    fn empty_payload_is_valid_and_last() {
        let data = Data::try_parse(&hex!("0003 0007")).unwrap();
        assert_eq!(data.block(), BlockId::new(7));
        assert!(data.is_empty());
        assert!(data.is_last_block());
    }

    #[test]
    fn full_block_is_not_last() {
        let data = Data::new(BlockId::FIRST, vec![0xAA; BLOCK_SIZE]).unwrap();
        assert!(!data.is_last_block());

        let bytes = data.to_bytes().unwrap();
        assert_eq!(bytes.len(), MAX_DATA_FRAME_LEN);
        assert_eq!(Data::try_parse(&bytes), Ok(data));
    }

    #[test]
    fn oversized_payload_rejected() {
        assert_eq!(
            Data::new(BlockId::FIRST, vec![0; BLOCK_SIZE + 1]),
            Err(ProtocolError::PayloadTooLarge { actual: BLOCK_SIZE + 1, max: BLOCK_SIZE })
        );

        let mut frame = vec![0x00, 0x03, 0x00, 0x01];
        frame.extend_from_slice(&[0; BLOCK_SIZE + 1]);
        assert_eq!(
            Data::try_parse(&frame),
            Err(ProtocolError::FrameTooLarge { actual: MAX_DATA_FRAME_LEN + 1, max: MAX_DATA_FRAME_LEN })
        );
    }

    #[test]
    fn header_shorter_than_four_bytes_rejected() {
        assert!(matches!(Data::try_parse(&hex!("0003 00")), Err(ProtocolError::FrameTooShort { .. })));
    }

    #[test]
    fn view_borrows_caller_buffer() {
        let raw = hex!("0003 0100 010203");
        let (block, payload) = Data::parse_view(&raw).unwrap();
        assert_eq!(block, BlockId::new(256));
        assert_eq!(payload.as_ptr(), raw[4..].as_ptr());
    }

    #[test]
    fn encode_into_small_buffer_writes_nothing() {
        let data = Data::new(BlockId::FIRST, &b"abc"[..]).unwrap();
        let mut buf = [0u8; 6];
        assert!(data.encode(&mut buf).is_err());
        assert_eq!(buf, [0; 6]);
    }
}
