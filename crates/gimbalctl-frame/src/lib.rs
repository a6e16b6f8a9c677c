//! Checksummed ASCII framing for the TP gimbal control protocol.
//!
//! Every command travels as one text frame:
//! - A 3-byte marker (`#TP`, or `#tp` for the legacy text variant)
//! - Source and destination address tokens
//! - A single hex digit carrying the payload length
//! - A control character (`w`/`r`) and a 3-character identifier
//! - The payload, then a two-digit additive checksum
//!
//! Everything here is pure: building, decoding and reply checks do no I/O.

pub mod codec;
pub mod command;
pub mod error;
pub mod reply;
pub mod types;

pub use codec::{
    build_dynamic_frame, build_fixed_frame, build_legacy_frame, checksum, decode_frame,
    AddressLayout, DecodedFrame, Frame, FIXED_LENGTH, MAX_DYNAMIC_PAYLOAD, MAX_LEGACY_TEXT,
    MAX_LENGTH_FIELD,
};
pub use command::{DEVICE, GIMBAL, USER};
pub use error::{FrameError, Result};
pub use reply::{is_error_response, min_reply_len, validate_address_echo, ERROR_SENTINEL};
pub use types::{Address, ControlType, Identifier, Marker};
