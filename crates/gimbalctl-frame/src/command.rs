//! Address and identifier catalogue.
//!
//! The controller always speaks as [`USER`]. Motion and optics commands go
//! to [`GIMBAL`]; recording, capture and thermal commands go to [`DEVICE`].

use crate::types::{Address, Identifier};

/// The controlling application.
pub const USER: Address = Address::single(b'U');

/// Gimbal domain (motion, zoom, install mode).
pub const GIMBAL: Address = Address::single(b'G');

/// Device/media domain (recording, capture, thermal imaging, firmware).
pub const DEVICE: Address = Address::single(b'D');

/// Base gimbal control and install mode.
pub const PTZ: Identifier = Identifier::from_static(b"PTZ");
/// Yaw angle set.
pub const GAY: Identifier = Identifier::from_static(b"GAY");
/// Pitch angle set.
pub const GAP: Identifier = Identifier::from_static(b"GAP");
/// Roll angle set.
pub const GAR: Identifier = Identifier::from_static(b"GAR");
/// Yaw speed set.
pub const GSY: Identifier = Identifier::from_static(b"GSY");
/// Pitch speed set.
pub const GSP: Identifier = Identifier::from_static(b"GSP");
/// Recording control and query.
pub const REC: Identifier = Identifier::from_static(b"REC");
/// Photo capture.
pub const CAP: Identifier = Identifier::from_static(b"CAP");
/// Zoom mode.
pub const DZM: Identifier = Identifier::from_static(b"DZM");
/// Thermal color palette.
pub const IMG: Identifier = Identifier::from_static(b"IMG");
/// Firmware version query.
pub const VER: Identifier = Identifier::from_static(b"VER");

/// Every identifier the controller knows how to send.
pub const KNOWN_IDENTIFIERS: [Identifier; 11] =
    [PTZ, GAY, GAP, GAR, GSY, GSP, REC, CAP, DZM, IMG, VER];

/// Returns a human-readable description for an identifier.
pub fn identifier_name(id: Identifier) -> &'static str {
    match id.as_bytes() {
        b"PTZ" => "gimbal control",
        b"GAY" => "yaw angle",
        b"GAP" => "pitch angle",
        b"GAR" => "roll angle",
        b"GSY" => "yaw speed",
        b"GSP" => "pitch speed",
        b"REC" => "recording",
        b"CAP" => "capture",
        b"DZM" => "zoom mode",
        b"IMG" => "thermal color mode",
        b"VER" => "firmware version",
        _ => "unknown",
    }
}

/// Returns true if the identifier is in the controller's catalogue.
pub fn is_known(id: Identifier) -> bool {
    KNOWN_IDENTIFIERS.contains(&id)
}

/// Returns a human-readable name for an address token.
pub fn address_name(addr: Address) -> &'static str {
    match addr.as_bytes() {
        b"U" => "user",
        b"G" => "gimbal",
        b"D" => "device",
        _ => "other",
    }
}
