//! Transfer mode carried by read and write requests.

use std::{fmt, str::FromStr};

use crate::ProtocolError;

/// Transfer mode named in a request.
///
/// Parsed case-insensitively; always encoded in lowercase. The mode is
/// carried through the protocol but does not change how payload bytes are
/// handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `netascii`
    NetAscii,
    /// `octet`
    Octet,
    /// `mail`
    Mail,
}

impl Mode {
    /// All modes, in wire-name order.
    pub const ALL: [Self; 3] = [Self::NetAscii, Self::Octet, Self::Mail];

    /// Canonical wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetAscii => "netascii",
            Self::Octet => "octet",
            Self::Mail => "mail",
        }
    }

    /// Match raw request bytes against the known mode names.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ProtocolError> {
        Self::ALL.into_iter().find(|mode| raw.eq_ignore_ascii_case(mode.as_str().as_bytes())).ok_or_else(
            || ProtocolError::UnsupportedMode(String::from_utf8_lossy(raw).into_owned()),
        )
    }
}

impl FromStr for Mode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
