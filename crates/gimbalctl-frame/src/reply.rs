//! Checks applied to device replies before a command counts as confirmed.

use crate::codec::Frame;
use crate::types::Marker;

/// Literal the device embeds in a reply to report a failed command.
pub const ERROR_SENTINEL: &[u8] = b"ERE!!";

/// Returns true iff `response` contains [`ERROR_SENTINEL`] anywhere.
pub fn is_error_response(response: &[u8]) -> bool {
    response
        .windows(ERROR_SENTINEL.len())
        .any(|window| window == ERROR_SENTINEL)
}

/// Shortest reply that still carries both address tokens for `sent`.
pub fn min_reply_len(sent: &Frame) -> usize {
    Marker::LEN + sent.source().len() + sent.dest().len()
}

/// Returns true iff `response` is addressed back to the sender of `sent`.
///
/// The reply must carry `sent`'s destination token followed by its source
/// token right after the marker. A reply too short to hold both is rejected.
pub fn validate_address_echo(sent: &Frame, response: &[u8]) -> bool {
    let min = min_reply_len(sent);
    if response.len() < min {
        return false;
    }

    let dest = sent.dest();
    let source = sent.source();
    let (reply_source, reply_dest) = response[Marker::LEN..min].split_at(dest.len());
    reply_source == dest.as_bytes() && reply_dest == source.as_bytes()
}
