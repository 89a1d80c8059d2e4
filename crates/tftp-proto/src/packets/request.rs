use std::fmt;

use super::{MAX_REQUEST_FRAME_LEN, WirePacket, check_frame_len, check_opcode, expect_end};
use crate::{Mode, Opcode, ProtocolError, Reader, Result, Writer, opcodes::OPCODE_LEN};

/// Opcode plus the two NUL terminators.
const MIN_REQUEST_FRAME_LEN: usize = OPCODE_LEN + 2;

/// Filename and mode shared by read and write requests.
///
/// The filename is ASCII without NUL bytes and short enough that the encoded
/// frame fits in [`MAX_REQUEST_FRAME_LEN`]; [`Request::new`] enforces this so
/// every constructed request encodes to a frame that parses back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    filename: String,
    mode: Mode,
}

impl Request {
    /// Build a request for `filename`.
    pub fn new(filename: impl Into<String>, mode: Mode) -> Result<Self> {
        let filename = filename.into();
        if !filename.is_ascii() || filename.contains('\0') {
            return Err(ProtocolError::InvalidText);
        }
        let request = Self { filename, mode };
        let len = request.frame_len();
        if len > MAX_REQUEST_FRAME_LEN {
            return Err(ProtocolError::FrameTooLarge { actual: len, max: MAX_REQUEST_FRAME_LEN });
        }
        Ok(request)
    }

    /// Requested filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Requested transfer mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn frame_len(&self) -> usize {
        MIN_REQUEST_FRAME_LEN + self.filename.len() + self.mode.as_str().len()
    }

    fn parse(raw: &[u8], opcode: Opcode) -> Result<Self> {
        check_frame_len(raw, MIN_REQUEST_FRAME_LEN, MAX_REQUEST_FRAME_LEN)?;
        let mut reader = Reader::new(raw);
        check_opcode(reader.read_u16()?, opcode)?;

        let filename = read_text(&mut reader)?;
        let mode = Mode::from_bytes(reader.read_until_nul()?)?;
        expect_end(&reader)?;

        Ok(Self { filename: filename.to_owned(), mode })
    }

    pub(crate) fn encode_frame(&self, opcode: Opcode, writer: &mut Writer<'_>) -> Result<()> {
        let needed = self.frame_len();
        if writer.available() < needed {
            return Err(ProtocolError::BufferTooSmall { needed, available: writer.available() });
        }
        writer.write_u16(opcode.to_u16())?;
        writer.write_all(self.filename.as_bytes())?;
        writer.write_one(0)?;
        writer.write_all(self.mode.as_str().as_bytes())?;
        writer.write_one(0)
    }
}

fn read_text<'a>(reader: &mut Reader<'a>) -> Result<&'a str> {
    let raw = reader.read_until_nul()?;
    if !raw.is_ascii() {
        return Err(ProtocolError::InvalidText);
    }
    std::str::from_utf8(raw).map_err(|_| ProtocolError::InvalidText)
}

/// Read request (RRQ): the peer wants to download `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadRequest(pub Request);

/// Write request (WRQ): the peer wants to upload `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WriteRequest(pub Request);

impl WirePacket for ReadRequest {
    const OPCODE: Opcode = Opcode::ReadRequest;

    fn try_parse(raw: &[u8]) -> Result<Self> {
        Request::parse(raw, Self::OPCODE).map(Self)
    }

    fn encoded_len(&self) -> usize {
        self.0.frame_len()
    }

    fn encode_into(&self, writer: &mut Writer<'_>) -> Result<()> {
        self.0.encode_frame(Self::OPCODE, writer)
    }
}

impl WirePacket for WriteRequest {
    const OPCODE: Opcode = Opcode::WriteRequest;

    fn try_parse(raw: &[u8]) -> Result<Self> {
        Request::parse(raw, Self::OPCODE).map(Self)
    }

    fn encoded_len(&self) -> usize {
        self.0.frame_len()
    }

    fn encode_into(&self, writer: &mut Writer<'_>) -> Result<()> {
        self.0.encode_frame(Self::OPCODE, writer)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, mode: {}", self.filename, self.mode)
    }
}
