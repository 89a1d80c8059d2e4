use std::fmt;

use super::{BLOCK_HEADER_LEN, BlockHeader, WirePacket, check_frame_len, expect_end};
use crate::{BlockId, Opcode, Reader, Result, Writer};

/// Acknowledgement of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ack {
    block: BlockId,
}

impl Ack {
    /// Acknowledge `block`.
    pub const fn new(block: BlockId) -> Self {
        Self { block }
    }

    /// Acknowledged block id.
    pub const fn block(&self) -> BlockId {
        self.block
    }
}

impl WirePacket for Ack {
    const OPCODE: Opcode = Opcode::Ack;

    fn try_parse(raw: &[u8]) -> Result<Self> {
        check_frame_len(raw, BLOCK_HEADER_LEN, usize::MAX)?;
        let mut reader = Reader::new(raw);
        let header: &BlockHeader = reader.read_as()?;
        header.expect_opcode(Self::OPCODE)?;
        expect_end(&reader)?;
        Ok(Self { block: header.block() })
    }

    fn encoded_len(&self) -> usize {
        BLOCK_HEADER_LEN
    }

    fn encode_into(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_as(&BlockHeader::new(Self::OPCODE, self.block))
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ACK({})", self.block)
    }
}
