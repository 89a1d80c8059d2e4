//! Transfer error types.

use std::{io, time::Duration};

use thiserror::Error;
use tftp_proto::{BlockId, Opcode, ProtocolError};

use crate::transfer::TransferState;

/// Errors that end a transfer.
///
/// Every variant is terminal for the transfer it occurred in; nothing is
/// retried. Whether the connection survives is up to the caller.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Peer sent bytes that do not form a valid frame
    #[error("malformed frame: {0}")]
    Malformed(#[from] ProtocolError),

    /// Packet of the wrong type for the current state
    #[error("unexpected {opcode} packet in state {state:?}")]
    UnexpectedPacket {
        /// State the transfer was in
        state: TransferState,
        /// Opcode of the offending packet
        opcode: Opcode,
    },

    /// Packet carried the wrong block id
    #[error("block mismatch: expected {expected}, got {actual}")]
    BlockMismatch {
        /// Block id the transfer was waiting for
        expected: BlockId,
        /// Block id the peer sent
        actual: BlockId,
    },

    /// File needs more blocks than the 16-bit block id can number
    #[error("file of {size} bytes needs {blocks} blocks, limit is {max}")]
    FileTooLarge {
        /// File size in bytes
        size: u64,
        /// Blocks the file would need
        blocks: u64,
        /// Block limit
        max: u64,
    },

    /// Operation called in a state that does not allow it
    #[error("invalid operation {operation} in state {state:?}")]
    InvalidState {
        /// Current state
        state: TransferState,
        /// Attempted operation
        operation: String,
    },

    /// Requested file does not exist
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Peer closed the stream
    #[error("peer disconnected")]
    Disconnected,

    /// No frame arrived before the receive deadline
    #[error("no frame received within {0:?}")]
    Timeout(Duration),

    /// Stream or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransferError {
    /// Whether this error is a protocol sequencing violation by the peer.
    pub fn is_sequencing_violation(&self) -> bool {
        matches!(self, Self::UnexpectedPacket { .. } | Self::BlockMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = TransferError::BlockMismatch { expected: BlockId::new(3), actual: BlockId::new(7) };
        insta::assert_snapshot!(err.to_string(), @"block mismatch: expected 3, got 7");
        assert!(err.is_sequencing_violation());

        let err = TransferError::UnexpectedPacket {
            state: TransferState::AwaitingAck,
            opcode: Opcode::Data,
        };
        insta::assert_snapshot!(err.to_string(), @"unexpected DATA packet in state AwaitingAck");

        let err = TransferError::Malformed(ProtocolError::UnknownOpcode(9));
        insta::assert_snapshot!(err.to_string(), @"malformed frame: unknown opcode 0x0009");
        assert!(!err.is_sequencing_violation());
    }
}
