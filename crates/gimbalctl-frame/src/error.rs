/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the single hex digit length field.
    #[error("payload length {size} exceeds the length field ceiling (max {max})")]
    InvalidPayloadLength { size: usize, max: usize },

    /// An address token is empty, too wide, or not alphanumeric ASCII.
    #[error("invalid address token {0:?} (expected 1-3 ASCII alphanumerics)")]
    InvalidAddress(String),

    /// An identifier is not exactly three printable ASCII characters.
    #[error("invalid identifier {0:?} (expected 3 printable ASCII characters)")]
    InvalidIdentifier(String),

    /// Legacy payload text contains a non-printable or non-ASCII character.
    #[error("legacy payload must be printable ASCII")]
    InvalidPayloadText,

    /// The frame does not start with `#TP` or `#tp`.
    #[error("invalid frame marker (expected \"#TP\" or \"#tp\")")]
    InvalidMarker,

    /// The input ends before the fixed header and checksum.
    #[error("frame truncated ({len} bytes, need at least {min})")]
    Truncated { len: usize, min: usize },

    /// A header or payload field is not in the expected form.
    #[error("malformed frame: {0}")]
    Malformed(&'static str),

    /// The trailing checksum does not match the frame content.
    #[error("checksum mismatch (frame carries {carried:#04x}, computed {computed:#04x})")]
    ChecksumMismatch { carried: u8, computed: u8 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
