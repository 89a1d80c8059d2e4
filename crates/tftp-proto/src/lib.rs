//! Wire format for lockstep file transfer.
//!
//! Every frame starts with a 2-byte big-endian opcode. Four variants exist:
//! read request, write request, data, and acknowledgement. Requests carry two
//! NUL-terminated ASCII strings (filename and mode), data frames carry a block
//! id and up to 512 payload bytes, and acknowledgements carry a block id only.
//!
//! ```text
//! RRQ/WRQ   | opcode (2) | filename | 0x00 | mode | 0x00 |
//! DATA      | opcode (2) | block (2) | payload (0..=512) |
//! ACK       | opcode (2) | block (2) |
//! ```
//!
//! # Security
//!
//! Frames arrive from an untrusted peer. All buffer indexing goes through the
//! bounds-checked cursors in [`cursor`]; a failed read never moves the cursor,
//! so a parser can bail out at any point without leaving partial state behind.
//! Frame sizes are capped before any field is inspected.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod cursor;
pub mod errors;
pub mod mode;
pub mod opcodes;
pub mod packet;
pub mod packets;

pub use block::{BLOCK_SIZE, BlockId, MAX_BLOCKS, blocks_required, is_last_block};
pub use cursor::{Reader, Writer};
pub use errors::{ProtocolError, Result};
pub use mode::Mode;
pub use opcodes::Opcode;
pub use packet::Packet;
pub use packets::{
    Ack, Data, MAX_DATA_FRAME_LEN, MAX_FRAME_LEN, MAX_REQUEST_FRAME_LEN, ReadRequest, Request,
    WirePacket, WriteRequest,
};
