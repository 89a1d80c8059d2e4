//! Packet variants and their shared codec contract.
//!
//! Each variant validates raw frame bytes in the same order: frame length,
//! then opcode, then the variant body. Serialization writes the same fields in
//! the same order, so `try_parse(to_bytes(p)) == p` for every valid packet.

mod ack;
mod data;
mod request;

use bytes::Bytes;
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, byteorder::network_endian::U16,
};

pub use self::{
    ack::Ack,
    data::Data,
    request::{ReadRequest, Request, WriteRequest},
};
use crate::{BLOCK_SIZE, BlockId, Opcode, ProtocolError, Reader, Result, Writer};

/// Opcode plus block id: the fixed prefix of DATA and ACK frames.
pub const BLOCK_HEADER_LEN: usize = 4;

/// Largest DATA frame: header plus one full block.
pub const MAX_DATA_FRAME_LEN: usize = BLOCK_HEADER_LEN + BLOCK_SIZE;

/// Largest RRQ/WRQ frame.
pub const MAX_REQUEST_FRAME_LEN: usize = 512;

/// Largest frame of any variant.
pub const MAX_FRAME_LEN: usize = MAX_DATA_FRAME_LEN;

/// Codec for one packet variant.
pub trait WirePacket: Sized {
    /// Opcode every frame of this variant starts with.
    const OPCODE: Opcode;

    /// Validate and parse a complete frame.
    fn try_parse(raw: &[u8]) -> Result<Self>;

    /// Exact size of the encoded frame.
    fn encoded_len(&self) -> usize;

    /// Write the frame, opcode included.
    fn encode_into(&self, writer: &mut Writer<'_>) -> Result<()>;

    /// Encode into `out`, returning the number of bytes written.
    fn encode(&self, out: &mut [u8]) -> Result<usize> {
        let mut writer = Writer::new(out);
        self.encode_into(&mut writer)?;
        Ok(writer.position())
    }

    /// Encode into a freshly allocated buffer.
    fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = vec![0u8; self.encoded_len()];
        let written = self.encode(&mut buf)?;
        buf.truncate(written);
        Ok(Bytes::from(buf))
    }
}

/// Fixed DATA/ACK prefix, read and written in place.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct BlockHeader {
    opcode: U16,
    block: U16,
}

impl BlockHeader {
    fn new(opcode: Opcode, block: BlockId) -> Self {
        Self { opcode: U16::new(opcode.to_u16()), block: U16::new(block.get()) }
    }

    fn block(&self) -> BlockId {
        BlockId::new(self.block.get())
    }

    fn expect_opcode(&self, expected: Opcode) -> Result<()> {
        check_opcode(self.opcode.get(), expected)
    }
}

fn check_opcode(actual: u16, expected: Opcode) -> Result<()> {
    if actual == expected.to_u16() {
        Ok(())
    } else {
        Err(ProtocolError::OpcodeMismatch { expected, actual })
    }
}

fn check_frame_len(raw: &[u8], min: usize, max: usize) -> Result<()> {
    if raw.len() < min {
        return Err(ProtocolError::FrameTooShort { expected: min, actual: raw.len() });
    }
    if raw.len() > max {
        return Err(ProtocolError::FrameTooLarge { actual: raw.len(), max });
    }
    Ok(())
}

fn expect_end(reader: &Reader<'_>) -> Result<()> {
    match reader.available() {
        0 => Ok(()),
        n => Err(ProtocolError::TrailingBytes(n)),
    }
}
