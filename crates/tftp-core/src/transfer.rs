//! Transfer state machine.
//!
//! One [`Transfer`] drives a single read or write exchange in strict
//! lockstep: at most one block is ever unacknowledged.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods take the input (a file chunk or a parsed packet) as a parameter
//! - Methods return `Result<Vec<TransferAction>, TransferError>`
//! - The session driver executes the actions (send, read file, write file)
//!
//! # State Machine
//!
//! ```text
//! Read session (serving a file):
//!
//!               ACK(block), full block: block += 1
//!      ┌───────────────────────────────────────────┐
//!      ↓                                           │
//! ┌─────────┐  block_read   ┌─────────────┐        │
//! │ Sending │──────────────>│ AwaitingAck │────────┘
//! └─────────┘  send DATA    └─────────────┘
//!                             │         │ ACK(block), short block
//!         wrong packet/block  │         ↓
//!                             │   ┌──────────┐
//!                             │   │ Complete │
//!                             ↓   └──────────┘
//!                        ┌────────┐
//!                        │ Failed │
//!                        └────────┘
//!
//! Write session (receiving a file):
//!
//! ┌──────────────────┐  start   ┌──────────────┐  DATA(n), short ┌──────────┐
//! │ AwaitingFirstAck │─────────>│ AwaitingData │────────────────>│ Complete │
//! └──────────────────┘ send ACK └──────────────┘ send final ACK  └──────────┘
//!          │                     │    ^    │
//!          │ any packet          │    └────┘ DATA(n), full: send ACK(n+1)
//!          ↓                     ↓
//!      ┌────────┐  wrong packet / wrong block
//!      │ Failed │<─────────────
//!      └────────┘
//! ```
//!
//! # Block numbering
//!
//! Read sessions send DATA starting at block 1, and the peer acknowledges
//! each block by its own id. Write sessions start at block 0: `ACK(0)` answers
//! the request and invites `DATA(0)`. After accepting `DATA(n)` the counter
//! moves to `n+1` and `ACK(n+1)` goes out. This includes the final short
//! block, so an acknowledgement in a write session means "every block before
//! this id is stored". Ids wrap modulo 65536 in both directions.

use bytes::Bytes;
use tftp_proto::{Ack, BlockId, Data, MAX_BLOCKS, Packet, blocks_required};

use crate::TransferError;

/// Which way file bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Serving a file to the peer (answering a read request)
    Read,
    /// Receiving a file from the peer (answering a write request)
    Write,
}

/// Transfer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Read session: next block is being read from the file source
    Sending,
    /// Write session: created, initial ACK(0) not yet sent
    AwaitingFirstAck,
    /// Write session: ACK sent, waiting for the matching DATA
    AwaitingData,
    /// Read session: DATA sent, waiting for the matching ACK
    AwaitingAck,
    /// Final block exchanged
    Complete,
    /// Terminated by a protocol violation or I/O failure
    Failed,
}

impl TransferState {
    /// Whether the transfer has ended, either way.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Actions returned by the transfer state machine.
///
/// The driver executes these in order:
/// - `ReadBlock`: Read up to one block from the file, pass it to
///   [`Transfer::block_read`]
/// - `SendPacket`: Serialize and send the packet to the peer
/// - `WriteBlock`: Append the payload to the file
/// - `AwaitPacket`: Receive one frame, pass it to [`Transfer::handle_packet`]
/// - `Complete`: Flush the file; the transfer is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    /// Read the next block from the file source
    ReadBlock,
    /// Send this packet to the peer
    SendPacket(Packet),
    /// Append this payload to the file sink
    WriteBlock(Bytes),
    /// Wait for the peer's next packet
    AwaitPacket,
    /// Transfer finished successfully
    Complete,
}

/// Lockstep transfer state machine.
///
/// Pure state: no I/O. One instance per transfer; discard it once
/// [`TransferState::is_terminal`] holds.
#[derive(Debug, Clone)]
pub struct Transfer {
    direction: Direction,
    state: TransferState,
    /// Block id of the DATA in flight (read) or expected next (write)
    block: BlockId,
    /// Payload length of the DATA in flight (read sessions)
    in_flight: usize,
    /// Blocks exchanged so far
    blocks: u64,
    /// Payload bytes exchanged so far
    bytes: u64,
}

impl Transfer {
    /// Start serving a file of `size` bytes to the peer.
    ///
    /// # Errors
    /// Returns `FileTooLarge` if the file needs more than 65535 blocks
    pub fn read(size: u64) -> Result<Self, TransferError> {
        let blocks = blocks_required(size);
        if blocks > MAX_BLOCKS {
            return Err(TransferError::FileTooLarge { size, blocks, max: MAX_BLOCKS });
        }

        Ok(Self::new(Direction::Read, TransferState::Sending, BlockId::FIRST))
    }

    /// Start receiving a file from the peer.
    pub fn write() -> Self {
        Self::new(Direction::Write, TransferState::AwaitingFirstAck, BlockId::ZERO)
    }

    fn new(direction: Direction, state: TransferState, block: BlockId) -> Self {
        Self { direction, state, block, in_flight: 0, blocks: 0, bytes: 0 }
    }

    /// Transfer direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current state.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Current block id.
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Blocks exchanged so far.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Payload bytes exchanged so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Begin the exchange.
    ///
    /// Read sessions ask for the first block; write sessions acknowledge the
    /// request with `ACK(0)` and wait for data.
    ///
    /// # Errors
    /// Returns `InvalidState` if the transfer already started
    pub fn start(&mut self) -> Result<Vec<TransferAction>, TransferError> {
        match (self.direction, self.state) {
            (Direction::Read, TransferState::Sending) if self.blocks == 0 => {
                Ok(vec![TransferAction::ReadBlock])
            },
            (Direction::Write, TransferState::AwaitingFirstAck) => {
                self.state = TransferState::AwaitingData;
                Ok(vec![
                    TransferAction::SendPacket(Ack::new(self.block).into()),
                    TransferAction::AwaitPacket,
                ])
            },
            _ => Err(self.invalid_state("start")),
        }
    }

    /// Feed the next chunk of the file (at most one block).
    ///
    /// A chunk shorter than a full block is the last one.
    ///
    /// # Errors
    /// Returns `InvalidState` outside `Sending`, or `Malformed` if the chunk
    /// exceeds one block
    pub fn block_read(&mut self, chunk: Bytes) -> Result<Vec<TransferAction>, TransferError> {
        if self.state != TransferState::Sending {
            return Err(self.invalid_state("block_read"));
        }

        let data = Data::new(self.block, chunk)?;
        self.in_flight = data.len();
        self.state = TransferState::AwaitingAck;

        Ok(vec![TransferAction::SendPacket(data.into()), TransferAction::AwaitPacket])
    }

    /// Process a packet received from the peer.
    ///
    /// # Errors
    /// Returns `UnexpectedPacket` or `BlockMismatch` (and moves to `Failed`)
    /// if the packet breaks lockstep, or `InvalidState` once terminal
    pub fn handle_packet(&mut self, packet: Packet) -> Result<Vec<TransferAction>, TransferError> {
        match (self.state, packet) {
            (TransferState::AwaitingAck, Packet::Ack(ack)) => self.receive_ack(ack),
            (TransferState::AwaitingData, Packet::Data(data)) => self.receive_data(data),
            (state, _) if state.is_terminal() => Err(self.invalid_state("handle_packet")),
            (state, packet) => {
                Err(self.fail(TransferError::UnexpectedPacket { state, opcode: packet.opcode() }))
            },
        }
    }

    /// Mark the transfer failed after an error outside the state machine
    /// (I/O, timeout, malformed frame).
    ///
    /// No effect once complete.
    pub fn abort(&mut self) {
        if self.state != TransferState::Complete {
            self.state = TransferState::Failed;
        }
    }

    fn receive_ack(&mut self, ack: Ack) -> Result<Vec<TransferAction>, TransferError> {
        self.expect_block(ack.block())?;

        self.blocks += 1;
        self.bytes += self.in_flight as u64;

        if tftp_proto::is_last_block(self.in_flight) {
            self.state = TransferState::Complete;
            return Ok(vec![TransferAction::Complete]);
        }

        self.block = self.block.next();
        self.state = TransferState::Sending;
        Ok(vec![TransferAction::ReadBlock])
    }

    fn receive_data(&mut self, data: Data) -> Result<Vec<TransferAction>, TransferError> {
        self.expect_block(data.block())?;

        let last = data.is_last_block();
        self.blocks += 1;
        self.bytes += data.len() as u64;
        self.block = self.block.next();

        let mut actions = vec![
            TransferAction::WriteBlock(data.into_payload()),
            TransferAction::SendPacket(Ack::new(self.block).into()),
        ];

        if last {
            self.state = TransferState::Complete;
            actions.push(TransferAction::Complete);
        } else {
            actions.push(TransferAction::AwaitPacket);
        }

        Ok(actions)
    }

    fn expect_block(&mut self, actual: BlockId) -> Result<(), TransferError> {
        if actual == self.block {
            Ok(())
        } else {
            Err(self.fail(TransferError::BlockMismatch { expected: self.block, actual }))
        }
    }

    fn fail(&mut self, err: TransferError) -> TransferError {
        self.state = TransferState::Failed;
        err
    }

    fn invalid_state(&self, operation: &str) -> TransferError {
        TransferError::InvalidState { state: self.state, operation: operation.to_string() }
    }
}
