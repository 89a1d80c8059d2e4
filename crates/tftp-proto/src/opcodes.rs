//! Frame opcodes.

use std::fmt;

use crate::ProtocolError;

/// Size of the opcode field at the start of every frame.
pub const OPCODE_LEN: usize = 2;

/// Opcode identifying a frame variant.
///
/// Encoded as a 2-byte big-endian integer. Opcode 5 (error report) is not part
/// of this protocol and decodes as [`ProtocolError::UnknownOpcode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    /// Read request (RRQ)
    ReadRequest = 1,
    /// Write request (WRQ)
    WriteRequest = 2,
    /// Data block (DATA)
    Data = 3,
    /// Acknowledgement (ACK)
    Ack = 4,
}

impl Opcode {
    /// Numeric wire value.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Look up an opcode by wire value.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::ReadRequest),
            2 => Some(Self::WriteRequest),
            3 => Some(Self::Data),
            4 => Some(Self::Ack),
            _ => None,
        }
    }

    /// Big-endian wire encoding.
    pub const fn to_be_bytes(self) -> [u8; OPCODE_LEN] {
        self.to_u16().to_be_bytes()
    }

    /// Short name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadRequest => "RRQ",
            Self::WriteRequest => "WRQ",
            Self::Data => "DATA",
            Self::Ack => "ACK",
        }
    }
}

impl TryFrom<u16> for Opcode {
    type Error = ProtocolError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_u16(value).ok_or(ProtocolError::UnknownOpcode(value))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values() {
        assert_eq!(Opcode::ReadRequest.to_be_bytes(), [0x00, 0x01]);
        assert_eq!(Opcode::WriteRequest.to_be_bytes(), [0x00, 0x02]);
        assert_eq!(Opcode::Data.to_be_bytes(), [0x00, 0x03]);
        assert_eq!(Opcode::Ack.to_be_bytes(), [0x00, 0x04]);
    }

    #[test]
    fn unknown_values_rejected() {
        for value in [0, 5, 9, 0x0100, u16::MAX] {
            assert_eq!(Opcode::try_from(value), Err(ProtocolError::UnknownOpcode(value)));
        }
    }
}
