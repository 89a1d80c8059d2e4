//! Opcode dispatch over the four packet variants.

use std::fmt;

use bytes::Bytes;

use crate::{
    Ack, Data, Opcode, ProtocolError, ReadRequest, Reader, Request, Result, WirePacket,
    WriteRequest, Writer, opcodes::OPCODE_LEN,
};

/// A parsed frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Packet {
    /// RRQ
    ReadRequest(Request),
    /// WRQ
    WriteRequest(Request),
    /// DATA
    Data(Data),
    /// ACK
    Ack(Ack),
}

impl Packet {
    /// Decode one complete frame.
    ///
    /// Reads the opcode and hands the whole frame to that variant's parser.
    /// Nothing beyond opcode selection is inspected here.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let opcode = Self::peek_opcode(raw)?;
        match opcode {
            Opcode::ReadRequest => ReadRequest::try_parse(raw).map(|rrq| Self::ReadRequest(rrq.0)),
            Opcode::WriteRequest => {
                WriteRequest::try_parse(raw).map(|wrq| Self::WriteRequest(wrq.0))
            },
            Opcode::Data => Data::try_parse(raw).map(Self::Data),
            Opcode::Ack => Ack::try_parse(raw).map(Self::Ack),
        }
    }

    /// Identify the variant of a frame from its first two bytes.
    pub fn peek_opcode(raw: &[u8]) -> Result<Opcode> {
        let mut reader = Reader::new(raw);
        let value = reader.read_u16().map_err(|_| ProtocolError::FrameTooShort {
            expected: OPCODE_LEN,
            actual: raw.len(),
        })?;
        Opcode::try_from(value)
    }

    /// Opcode of this packet.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::ReadRequest(_) => Opcode::ReadRequest,
            Self::WriteRequest(_) => Opcode::WriteRequest,
            Self::Data(_) => Opcode::Data,
            Self::Ack(_) => Opcode::Ack,
        }
    }

    /// Exact size of the encoded frame.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::ReadRequest(req) | Self::WriteRequest(req) => req.frame_len(),
            Self::Data(data) => data.encoded_len(),
            Self::Ack(ack) => ack.encoded_len(),
        }
    }

    /// Encode into `out`, returning the number of bytes written.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize> {
        let mut writer = Writer::new(out);
        match self {
            Self::ReadRequest(req) => req.encode_frame(Opcode::ReadRequest, &mut writer)?,
            Self::WriteRequest(req) => req.encode_frame(Opcode::WriteRequest, &mut writer)?,
            Self::Data(data) => data.encode_into(&mut writer)?,
            Self::Ack(ack) => ack.encode_into(&mut writer)?,
        }
        Ok(writer.position())
    }

    /// Encode into a freshly allocated buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = vec![0u8; self.encoded_len()];
        let written = self.encode(&mut buf)?;
        buf.truncate(written);
        Ok(Bytes::from(buf))
    }
}

impl From<Data> for Packet {
    fn from(data: Data) -> Self {
        Self::Data(data)
    }
}

impl From<Ack> for Packet {
    fn from(ack: Ack) -> Self {
        Self::Ack(ack)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadRequest(req) => write!(f, "RRQ({req})"),
            Self::WriteRequest(req) => write!(f, "WRQ({req})"),
            Self::Data(data) => write!(f, "{data}"),
            Self::Ack(ack) => write!(f, "{ack}"),
        }
    }
}
