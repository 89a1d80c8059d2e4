//! Transfer logic for the lockstep file-transfer protocol.
//!
//! The protocol rules live in a pure state machine, [`transfer::Transfer`],
//! which never touches a socket or a file. It answers every input with a list
//! of [`transfer::TransferAction`]s: send this packet, read the next block,
//! write this payload, wait for the peer. The session driver in [`session`]
//! executes those actions against a byte stream and a [`storage::FileStore`].
//!
//! Keeping I/O out of the state machine means every sequencing rule can be
//! tested by feeding packets in directly, and the same driver serves real TCP
//! connections and simulated ones.
//!
//! # Components
//!
//! - [`transfer`]: Read/write session state machine
//! - [`frame_reader`]: Reads one frame from a byte stream, with a deadline
//! - [`session`]: Drives a transfer over a stream and a file store
//! - [`storage`]: File store abstraction (in-memory and directory-backed)
//! - [`transport`]: Connection acceptor abstraction
//! - [`error`]: Transfer error types

pub mod error;
pub mod frame_reader;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod transport;

pub use error::TransferError;
pub use frame_reader::{FrameReader, send_packet};
pub use session::{
    DEFAULT_RECV_TIMEOUT, SessionConfig, TransferEvent, TransferSummary, serve_request,
};
pub use storage::{DirStore, FileStore, MemoryStore, MemoryWriter};
pub use transfer::{Direction, Transfer, TransferAction, TransferState};
pub use transport::Transport;
