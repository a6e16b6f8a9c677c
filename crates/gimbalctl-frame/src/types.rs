use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Frame marker, selecting the current or legacy encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `#TP`: hex-encoded payload, uppercase hex.
    Current,
    /// `#tp`: free-text payload, lowercase hex.
    Legacy,
}

impl Marker {
    /// Marker width on the wire.
    pub const LEN: usize = 3;

    pub fn as_bytes(self) -> &'static [u8; 3] {
        match self {
            Marker::Current => b"#TP",
            Marker::Legacy => b"#tp",
        }
    }

    /// Recognize a marker from the first three bytes of a frame.
    pub fn from_prefix(bytes: &[u8]) -> Option<Self> {
        match bytes.get(..Self::LEN)? {
            b"#TP" => Some(Marker::Current),
            b"#tp" => Some(Marker::Legacy),
            _ => None,
        }
    }
}

/// Whether a command writes a register or queries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlType {
    Write,
    Read,
}

impl ControlType {
    pub fn as_byte(self) -> u8 {
        match self {
            ControlType::Write => b'w',
            ControlType::Read => b'r',
        }
    }
}

impl TryFrom<u8> for ControlType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            b'w' => Ok(ControlType::Write),
            b'r' => Ok(ControlType::Read),
            _ => Err(FrameError::Malformed("control type must be 'w' or 'r'")),
        }
    }
}

impl FromStr for ControlType {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "w" | "write" => Ok(ControlType::Write),
            "r" | "read" => Ok(ControlType::Read),
            _ => Err(FrameError::Malformed("control type must be 'w' or 'r'")),
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// An address token: 1 to 3 ASCII alphanumeric characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    bytes: [u8; 3],
    len: u8,
}

impl Address {
    /// Widest address token accepted.
    pub const MAX_LEN: usize = 3;

    /// A one-character address. Panics at compile time if used in const
    /// context with a non-alphanumeric byte.
    pub const fn single(byte: u8) -> Self {
        assert!(byte.is_ascii_alphanumeric());
        Self {
            bytes: [byte, 0, 0],
            len: 1,
        }
    }

    /// Validate and copy an address token.
    pub fn from_bytes(token: &[u8]) -> Result<Self> {
        if token.is_empty()
            || token.len() > Self::MAX_LEN
            || !token.iter().all(u8::is_ascii_alphanumeric)
        {
            return Err(FrameError::InvalidAddress(
                String::from_utf8_lossy(token).into_owned(),
            ));
        }
        let mut bytes = [0u8; 3];
        bytes[..token.len()].copy_from_slice(token);
        Ok(Self {
            bytes,
            len: token.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn as_str(&self) -> &str {
        // Validated as ASCII on construction.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len as usize
    }
}

impl FromStr for Address {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.as_str()).finish()
    }
}

/// A 3-character command identifier (`REC`, `GAY`, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier([u8; 3]);

impl Identifier {
    pub const LEN: usize = 3;

    pub const fn from_static(code: &[u8; 3]) -> Self {
        Self(*code)
    }

    pub fn from_bytes(code: &[u8]) -> Result<Self> {
        let array: [u8; 3] = code.try_into().map_err(|_| invalid_identifier(code))?;
        if !array.iter().all(u8::is_ascii_graphic) {
            return Err(invalid_identifier(code));
        }
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

fn invalid_identifier(code: &[u8]) -> FrameError {
    FrameError::InvalidIdentifier(String::from_utf8_lossy(code).into_owned())
}

impl FromStr for Identifier {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identifier").field(&self.as_str()).finish()
    }
}
