use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::types::{Address, ControlType, Identifier, Marker};

/// Largest value the single hex digit length field can carry.
pub const MAX_LENGTH_FIELD: usize = 0xF;

/// Length digit written by fixed frames (one payload byte, two hex chars).
pub const FIXED_LENGTH: u8 = 2;

/// Most payload bytes a dynamic frame can carry (`2 * 7 <= 0xF`).
pub const MAX_DYNAMIC_PAYLOAD: usize = MAX_LENGTH_FIELD / 2;

/// Most text characters a legacy frame can carry (`3 + 12 <= 0xF`).
pub const MAX_LEGACY_TEXT: usize = MAX_LENGTH_FIELD - Identifier::LEN;

/// Width of the trailing checksum field.
pub const CHECKSUM_LEN: usize = 2;

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";
const LOWER_HEX: &[u8; 16] = b"0123456789abcdef";

/// A fully encoded command frame.
///
/// Keeps the header fields next to the wire bytes so replies can be
/// checked against the command that caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    marker: Marker,
    source: Address,
    dest: Address,
    control: ControlType,
    identifier: Identifier,
    wire: Bytes,
}

impl Frame {
    pub fn marker(&self) -> Marker {
        self.marker
    }

    pub fn source(&self) -> Address {
        self.source
    }

    pub fn dest(&self) -> Address {
        self.dest
    }

    pub fn control(&self) -> ControlType {
        self.control
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    /// The encoded frame, checksum included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.wire
    }

    /// The encoded frame as text. Frames are always ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.wire).unwrap_or_default()
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        self.wire.len()
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsigned 8-bit wraparound sum of every byte.
///
/// Frames are checksummed as text: each hex digit contributes its ASCII code.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Build a fixed-length frame carrying exactly one payload byte.
///
/// The length digit is always `2`. Read commands with nothing to say pass `0x00`.
/// ```text
/// #TP U G 2 w DZM 01 <ck>
/// ```
pub fn build_fixed_frame(
    source: Address,
    dest: Address,
    control: ControlType,
    identifier: Identifier,
    data: u8,
) -> Frame {
    let mut builder = FrameBuilder::new(
        Marker::Current,
        source,
        dest,
        FIXED_LENGTH,
        control,
        identifier,
        2,
    );
    builder.put_hex_byte(data);
    builder.finish()
}

/// Build a frame whose payload is an arbitrary byte sequence.
///
/// The length digit is `2 * data.len()`; anything above `0xF` is rejected,
/// never truncated.
pub fn build_dynamic_frame(
    source: Address,
    dest: Address,
    control: ControlType,
    identifier: Identifier,
    data: &[u8],
) -> Result<Frame> {
    if data.len() > MAX_DYNAMIC_PAYLOAD {
        return Err(FrameError::InvalidPayloadLength {
            size: data.len(),
            max: MAX_DYNAMIC_PAYLOAD,
        });
    }

    let length = (data.len() * 2) as u8;
    let mut builder = FrameBuilder::new(
        Marker::Current,
        source,
        dest,
        length,
        control,
        identifier,
        data.len() * 2,
    );
    for byte in data {
        builder.put_hex_byte(*byte);
    }
    Ok(builder.finish())
}

/// Build a legacy `#tp` frame with a free-text payload.
///
/// The length digit is `3 + text.len()`; digits are lowercase hex.
pub fn build_legacy_frame(
    source: Address,
    dest: Address,
    control: ControlType,
    identifier: Identifier,
    text: &str,
) -> Result<Frame> {
    if text.len() > MAX_LEGACY_TEXT {
        return Err(FrameError::InvalidPayloadLength {
            size: text.len(),
            max: MAX_LEGACY_TEXT,
        });
    }
    if !text.bytes().all(|b| b == b' ' || b.is_ascii_graphic()) {
        return Err(FrameError::InvalidPayloadText);
    }

    let length = (Identifier::LEN + text.len()) as u8;
    let mut builder = FrameBuilder::new(
        Marker::Legacy,
        source,
        dest,
        length,
        control,
        identifier,
        text.len(),
    );
    builder.put_ascii(text.as_bytes());
    Ok(builder.finish())
}

/// Accumulates one frame and enforces the field width rules.
///
/// Hex case follows the marker: uppercase for `#TP`, lowercase for `#tp`.
struct FrameBuilder {
    buf: BytesMut,
    digits: &'static [u8; 16],
    marker: Marker,
    source: Address,
    dest: Address,
    control: ControlType,
    identifier: Identifier,
}

impl FrameBuilder {
    /// Writes everything up to the payload. `length` must already fit one digit.
    fn new(
        marker: Marker,
        source: Address,
        dest: Address,
        length: u8,
        control: ControlType,
        identifier: Identifier,
        payload_len: usize,
    ) -> Self {
        let digits = match marker {
            Marker::Current => UPPER_HEX,
            Marker::Legacy => LOWER_HEX,
        };
        let header = Marker::LEN + source.len() + dest.len() + 1 + 1 + Identifier::LEN;
        let mut builder = Self {
            buf: BytesMut::with_capacity(header + payload_len + CHECKSUM_LEN),
            digits,
            marker,
            source,
            dest,
            control,
            identifier,
        };

        builder.put_ascii(marker.as_bytes());
        builder.put_ascii(source.as_bytes());
        builder.put_ascii(dest.as_bytes());
        builder.put_hex_nibble(length);
        builder.buf.put_u8(control.as_byte());
        builder.put_ascii(identifier.as_bytes());
        builder
    }

    fn put_ascii(&mut self, text: &[u8]) {
        self.buf.put_slice(text);
    }

    /// One hex digit. Only the low nibble is used.
    fn put_hex_nibble(&mut self, value: u8) {
        debug_assert!(value as usize <= MAX_LENGTH_FIELD);
        self.buf.put_u8(self.digits[(value & 0x0F) as usize]);
    }

    /// Two zero-padded hex digits.
    fn put_hex_byte(&mut self, value: u8) {
        self.buf.put_u8(self.digits[(value >> 4) as usize]);
        self.buf.put_u8(self.digits[(value & 0x0F) as usize]);
    }

    fn finish(mut self) -> Frame {
        let crc = checksum(&self.buf);
        self.put_hex_byte(crc);
        Frame {
            marker: self.marker,
            source: self.source,
            dest: self.dest,
            control: self.control,
            identifier: self.identifier,
            wire: self.buf.freeze(),
        }
    }
}

/// Address token widths used to split an incoming frame.
///
/// The wire carries no delimiter between the two tokens, so the widths must
/// be known up front. Every address in the catalogue is one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLayout {
    pub source_width: usize,
    pub dest_width: usize,
}

impl AddressLayout {
    /// The layout a reply to `frame` is expected to use (tokens swapped).
    pub fn reply_to(frame: &Frame) -> Self {
        Self {
            source_width: frame.dest().len(),
            dest_width: frame.source().len(),
        }
    }

    fn header_len(&self) -> usize {
        Marker::LEN + self.source_width + self.dest_width + 1 + 1 + Identifier::LEN
    }
}

impl Default for AddressLayout {
    fn default() -> Self {
        Self {
            source_width: 1,
            dest_width: 1,
        }
    }
}

/// A frame parsed from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub marker: Marker,
    pub source: Address,
    pub dest: Address,
    /// The raw length digit.
    pub length: u8,
    pub control: ControlType,
    pub identifier: Identifier,
    /// Hex-decoded bytes for `#TP` frames, the text itself for `#tp` frames.
    pub payload: Bytes,
    pub checksum: u8,
}

impl DecodedFrame {
    /// Render the payload as text: printable payloads verbatim, anything
    /// else as uppercase hex.
    pub fn payload_text(&self) -> String {
        if self.payload.iter().all(|b| *b == b' ' || b.is_ascii_graphic()) {
            return String::from_utf8_lossy(&self.payload).into_owned();
        }
        self.payload
            .iter()
            .flat_map(|b| [UPPER_HEX[(b >> 4) as usize], UPPER_HEX[(b & 0x0F) as usize]])
            .map(char::from)
            .collect()
    }
}

/// Decode and verify a complete frame.
///
/// Checks the marker, the address and identifier tokens, the checksum, and
/// that the payload size agrees with the length digit. Hex digits are
/// accepted in either case.
pub fn decode_frame(src: &[u8], layout: AddressLayout) -> Result<DecodedFrame> {
    let header_len = layout.header_len();
    let min = header_len + CHECKSUM_LEN;
    if src.len() < min {
        return Err(FrameError::Truncated {
            len: src.len(),
            min,
        });
    }

    let marker = Marker::from_prefix(src).ok_or(FrameError::InvalidMarker)?;
    let mut pos = Marker::LEN;

    let source = Address::from_bytes(&src[pos..pos + layout.source_width])?;
    pos += layout.source_width;
    let dest = Address::from_bytes(&src[pos..pos + layout.dest_width])?;
    pos += layout.dest_width;

    let length = hex_value(src[pos]).ok_or(FrameError::Malformed("length digit is not hex"))?;
    pos += 1;
    let control = ControlType::try_from(src[pos])?;
    pos += 1;
    let identifier = Identifier::from_bytes(&src[pos..pos + Identifier::LEN])?;
    pos += Identifier::LEN;

    let body_end = src.len() - CHECKSUM_LEN;
    let carried = decode_hex_byte(src[body_end], src[body_end + 1])
        .ok_or(FrameError::Malformed("checksum is not hex"))?;
    let computed = checksum(&src[..body_end]);
    if carried != computed {
        return Err(FrameError::ChecksumMismatch { carried, computed });
    }

    let body = &src[pos..body_end];
    let payload = match marker {
        Marker::Current => {
            if body.len() != length as usize {
                return Err(FrameError::Malformed("payload size disagrees with length digit"));
            }
            if body.len() % 2 != 0 {
                return Err(FrameError::Malformed("odd number of payload hex digits"));
            }
            let decoded = body
                .chunks_exact(2)
                .map(|pair| decode_hex_byte(pair[0], pair[1]))
                .collect::<Option<Vec<u8>>>()
                .ok_or(FrameError::Malformed("payload is not hex"))?;
            Bytes::from(decoded)
        }
        Marker::Legacy => {
            let expected = (length as usize).checked_sub(Identifier::LEN).ok_or(
                FrameError::Malformed("legacy length digit smaller than identifier"),
            )?;
            if body.len() != expected {
                return Err(FrameError::Malformed("payload size disagrees with length digit"));
            }
            Bytes::copy_from_slice(body)
        }
    };

    Ok(DecodedFrame {
        marker,
        source,
        dest,
        length,
        control,
        identifier,
        payload,
        checksum: carried,
    })
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

fn decode_hex_byte(high: u8, low: u8) -> Option<u8> {
    Some(hex_value(high)? << 4 | hex_value(low)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CAP, DEVICE, DZM, GAY, GIMBAL, PTZ, REC, USER};

    fn trailing_checksum(frame: &Frame) -> u8 {
        let wire = frame.as_bytes();
        let n = wire.len();
        decode_hex_byte(wire[n - 2], wire[n - 1]).unwrap()
    }

    #[test]
    fn test_fixed_frame_exact_bytes() {
        let frame = build_fixed_frame(USER, GIMBAL, ControlType::Write, DZM, 0x01);
        let expected_prefix = "#TPUG2wDZM01";
        let ck = checksum(expected_prefix.as_bytes());

        assert_eq!(frame.as_str(), format!("{expected_prefix}{ck:02X}"));
        assert_eq!(frame.as_str(), "#TPUG2wDZM0158");
    }

    #[test]
    fn test_fixed_frame_matches_recorded_device_reply_format() {
        // The device answers a recording query with these exact frames.
        let idle = build_fixed_frame(DEVICE, USER, ControlType::Read, REC, 0x00);
        let recording = build_fixed_frame(DEVICE, USER, ControlType::Read, REC, 0x01);
        assert_eq!(idle.as_str(), "#TPDU2rREC003E");
        assert_eq!(recording.as_str(), "#TPDU2rREC013F");
    }

    #[test]
    fn test_fixed_equals_single_byte_dynamic() {
        let fixed = build_fixed_frame(USER, DEVICE, ControlType::Write, CAP, 0x01);
        let dynamic = build_dynamic_frame(USER, DEVICE, ControlType::Write, CAP, &[0x01]).unwrap();
        assert_eq!(fixed, dynamic);
    }

    #[test]
    fn test_dynamic_frame_length_and_size() {
        for n in 0..=MAX_DYNAMIC_PAYLOAD {
            let data: Vec<u8> = (0..n as u8).map(|i| i.wrapping_mul(37)).collect();
            let frame = build_dynamic_frame(USER, GIMBAL, ControlType::Write, GAY, &data).unwrap();

            let header = Marker::LEN + 1 + 1 + 1 + 1 + Identifier::LEN;
            assert_eq!(frame.wire_size(), header + 2 * n + CHECKSUM_LEN);

            let nibble = hex_value(frame.as_bytes()[5]).unwrap();
            assert_eq!(nibble as usize, 2 * n);
        }
    }

    #[test]
    fn test_dynamic_frame_uppercase_zero_padded() {
        let frame = build_dynamic_frame(USER, GIMBAL, ControlType::Write, GAY, &[0x0A, 0xFF, 0x05])
            .unwrap();
        assert!(frame.as_str().starts_with("#TPUG6wGAY0AFF05"));
    }

    #[test]
    fn test_dynamic_frame_rejects_oversized_payload() {
        let err = build_dynamic_frame(USER, GIMBAL, ControlType::Write, GAY, &[0u8; 16])
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidPayloadLength { size: 16, max: 7 }
        ));

        let err = build_dynamic_frame(USER, GIMBAL, ControlType::Write, GAY, &[0u8; 8])
            .unwrap_err();
        assert!(matches!(err, FrameError::InvalidPayloadLength { size: 8, .. }));
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(b"#TPUG2wDZM01"), 0x58);
    }

    #[test]
    fn test_trailing_checksum_matches_prefix_for_every_variant() {
        let frames = [
            build_fixed_frame(USER, GIMBAL, ControlType::Write, PTZ, 0x0B),
            build_fixed_frame(USER, DEVICE, ControlType::Read, REC, 0x00),
            build_dynamic_frame(USER, GIMBAL, ControlType::Write, GAY, &[0x23, 0x28, 0x5A])
                .unwrap(),
            build_dynamic_frame(USER, GIMBAL, ControlType::Write, GAY, &[]).unwrap(),
            build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, "05").unwrap(),
        ];
        for frame in &frames {
            let prefix = &frame.as_bytes()[..frame.wire_size() - CHECKSUM_LEN];
            assert_eq!(checksum(prefix), trailing_checksum(frame), "{frame}");
        }
    }

    #[test]
    fn test_legacy_frame_layout() {
        let frame = build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, "05").unwrap();
        let prefix = "#tpUG5wPTZ05";
        assert_eq!(frame.as_str(), format!("{prefix}{:02x}", checksum(prefix.as_bytes())));
        assert_eq!(frame.marker(), Marker::Legacy);
    }

    #[test]
    fn test_legacy_frame_lowercase_length_digit() {
        let frame = build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, "abcdefgh").unwrap();
        assert_eq!(frame.as_bytes()[5], b'b');
    }

    #[test]
    fn test_legacy_frame_limits() {
        assert!(build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, &"x".repeat(12)).is_ok());
        assert!(matches!(
            build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, &"x".repeat(13)),
            Err(FrameError::InvalidPayloadLength { size: 13, max: 12 })
        ));
        assert!(matches!(
            build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, "a\nb"),
            Err(FrameError::InvalidPayloadText)
        ));
    }

    #[test]
    fn test_wider_addresses_are_written_verbatim() {
        let source: Address = "U1".parse().unwrap();
        let dest: Address = "G23".parse().unwrap();
        let frame = build_fixed_frame(source, dest, ControlType::Write, DZM, 0x02);
        assert!(frame.as_str().starts_with("#TPU1G232wDZM02"));
    }

    #[test]
    fn test_decode_status_reply() {
        let decoded = decode_frame(b"#TPDU2rREC013F", AddressLayout::default()).unwrap();
        assert_eq!(decoded.marker, Marker::Current);
        assert_eq!(decoded.source, DEVICE);
        assert_eq!(decoded.dest, USER);
        assert_eq!(decoded.length, 2);
        assert_eq!(decoded.control, ControlType::Read);
        assert_eq!(decoded.identifier, REC);
        assert_eq!(decoded.payload.as_ref(), &[0x01]);
        assert_eq!(decoded.checksum, 0x3F);
    }

    #[test]
    fn test_decode_recovers_dynamic_payload() {
        let frame = build_dynamic_frame(USER, GIMBAL, ControlType::Write, GAY, &[0xDC, 0xD8, 0x0A])
            .unwrap();
        let decoded = decode_frame(frame.as_bytes(), AddressLayout::default()).unwrap();
        assert_eq!(decoded.length, 6);
        assert_eq!(decoded.payload.as_ref(), &[0xDC, 0xD8, 0x0A]);
    }

    #[test]
    fn test_decode_legacy_text() {
        let frame = build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, "0c").unwrap();
        let decoded = decode_frame(frame.as_bytes(), AddressLayout::default()).unwrap();
        assert_eq!(decoded.marker, Marker::Legacy);
        assert_eq!(decoded.payload.as_ref(), b"0c");
        assert_eq!(decoded.payload_text(), "0c");
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let result = decode_frame(b"#TPDU2rREC0140", AddressLayout::default());
        assert!(matches!(
            result,
            Err(FrameError::ChecksumMismatch {
                carried: 0x40,
                computed: 0x3F
            })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_and_bad_marker() {
        assert!(matches!(
            decode_frame(b"#TPDU2r", AddressLayout::default()),
            Err(FrameError::Truncated { len: 7, min: 12 })
        ));
        assert!(matches!(
            decode_frame(b"$TPDU2rREC013F", AddressLayout::default()),
            Err(FrameError::InvalidMarker)
        ));
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let prefix = b"#TPDU4rREC01";
        let mut wire = prefix.to_vec();
        wire.extend_from_slice(format!("{:02X}", checksum(prefix)).as_bytes());
        assert!(matches!(
            decode_frame(&wire, AddressLayout::default()),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_payload_text_falls_back_to_hex() {
        let decoded = decode_frame(b"#TPDU2rREC013F", AddressLayout::default()).unwrap();
        assert_eq!(decoded.payload_text(), "01");

        let frame = build_dynamic_frame(DEVICE, USER, ControlType::Read, REC, b"V1.2").unwrap();
        let decoded = decode_frame(frame.as_bytes(), AddressLayout::default()).unwrap();
        assert_eq!(decoded.payload_text(), "V1.2");
    }

    #[test]
    fn test_reply_layout_swaps_widths() {
        let frame = build_fixed_frame("U1".parse().unwrap(), GIMBAL, ControlType::Read, REC, 0);
        let layout = AddressLayout::reply_to(&frame);
        assert_eq!(layout.source_width, 1);
        assert_eq!(layout.dest_width, 2);
    }
}
