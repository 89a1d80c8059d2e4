//! Error types for frame parsing and serialization.

use thiserror::Error;

use crate::Opcode;

/// Result alias for wire format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while parsing or serializing frames.
///
/// Every variant describes a malformed frame (or a buffer that cannot hold an
/// encoded one). None of them say anything about the connection itself; the
/// caller decides whether a bad frame is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Frame is shorter than the minimum for its variant
    #[error("frame too short: need at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum frame length
        expected: usize,
        /// Actual frame length
        actual: usize,
    },

    /// Frame exceeds the maximum for its variant
    #[error("frame too large: {actual} bytes exceeds {max}")]
    FrameTooLarge {
        /// Actual frame length
        actual: usize,
        /// Maximum frame length
        max: usize,
    },

    /// Opcode is not one of the four known variants
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),

    /// Opcode does not match the variant being parsed
    #[error("expected {expected} opcode, got {actual:#06x}")]
    OpcodeMismatch {
        /// Opcode of the variant being parsed
        expected: Opcode,
        /// Opcode found in the frame
        actual: u16,
    },

    /// Read cursor ran past the end of the buffer
    #[error("truncated read: need {needed} bytes, {available} available")]
    Truncated {
        /// Bytes requested
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },

    /// Write cursor ran past the end of the buffer
    #[error("buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall {
        /// Bytes to be written
        needed: usize,
        /// Capacity left in the buffer
        available: usize,
    },

    /// Request string has no NUL terminator
    #[error("missing NUL terminator")]
    MissingTerminator,

    /// Mode string is not netascii, octet, or mail
    #[error("unsupported transfer mode {0:?}")]
    UnsupportedMode(String),

    /// Request string contains non-ASCII bytes (or NUL, when constructing)
    #[error("text must be ASCII without NUL bytes")]
    InvalidText,

    /// Bytes remain after the variant's last field
    #[error("{0} trailing bytes after frame body")]
    TrailingBytes(usize),

    /// Data payload exceeds one block
    #[error("payload of {actual} bytes exceeds block size {max}")]
    PayloadTooLarge {
        /// Payload length
        actual: usize,
        /// Block size
        max: usize,
    },
}
