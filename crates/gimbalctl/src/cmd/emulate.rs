use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gimbalctl_frame::command::{is_known, REC, VER};
use gimbalctl_frame::{
    build_dynamic_frame, build_fixed_frame, build_legacy_frame, decode_frame, AddressLayout,
    ControlType, DecodedFrame, Marker, ERROR_SENTINEL, MAX_DYNAMIC_PAYLOAD,
};
use gimbalctl_session::RecordState;
use gimbalctl_transport::{DatagramSocket, UdpTransport};
use tracing::{debug, info, warn};

use crate::cmd::EmulateArgs;
use crate::exit::{io_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_outcome, OutputFormat, Outcome};

pub const DEFAULT_FIRMWARE: &str = "emu-1.0";

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Simulated device answering on both the gimbal and device addresses.
///
/// Replies carry the request's addresses swapped. Anything it cannot decode
/// or does not know is answered with an error-sentinel frame.
#[derive(Debug)]
pub struct Device {
    recording: bool,
    firmware: String,
}

impl Device {
    pub fn new(firmware: &str) -> CliResult<Self> {
        if firmware.is_empty()
            || firmware.len() > MAX_DYNAMIC_PAYLOAD
            || !firmware.bytes().all(|b| b.is_ascii_graphic())
        {
            let message = format!(
                "firmware string must be 1-{MAX_DYNAMIC_PAYLOAD} printable characters: {firmware:?}"
            );
            return Err(CliError::new(USAGE, message));
        }
        Ok(Self {
            recording: false,
            firmware: firmware.to_string(),
        })
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Build the reply datagram for one request.
    pub fn respond(&mut self, request: &[u8]) -> Vec<u8> {
        let decoded = match decode_frame(request, AddressLayout::default()) {
            Ok(decoded) => decoded,
            Err(err) => {
                let request_text = String::from_utf8_lossy(request);
                warn!(error = %err, request = %request_text, "undecodable request");
                return error_reply(request);
            }
        };

        match self.reply_to(&decoded) {
            Some(reply) => reply,
            None => {
                warn!(identifier = %decoded.identifier, "rejected request");
                error_reply(request)
            }
        }
    }

    fn reply_to(&mut self, request: &DecodedFrame) -> Option<Vec<u8>> {
        let (source, dest) = (request.dest, request.source);
        let (control, identifier) = (request.control, request.identifier);

        if request.marker == Marker::Legacy {
            let text = std::str::from_utf8(&request.payload).ok()?;
            let frame = build_legacy_frame(source, dest, control, identifier, text).ok()?;
            return Some(frame.as_bytes().to_vec());
        }

        let data = match (identifier, control) {
            (REC, ControlType::Write) => {
                let state = RecordState::from_byte(*request.payload.first()?)?;
                self.recording = match state {
                    RecordState::Start => true,
                    RecordState::Stop => false,
                    RecordState::Toggle => !self.recording,
                };
                info!(recording = self.recording, "recording state changed");
                vec![u8::from(self.recording)]
            }
            (REC, ControlType::Read) => vec![u8::from(self.recording)],
            (VER, ControlType::Read) => self.firmware.as_bytes().to_vec(),
            (id, _) if is_known(id) => request.payload.to_vec(),
            _ => return None,
        };

        let frame = match data.as_slice() {
            [byte] => build_fixed_frame(source, dest, control, identifier, *byte),
            bytes => build_dynamic_frame(source, dest, control, identifier, bytes).ok()?,
        };
        Some(frame.as_bytes().to_vec())
    }
}

/// `#TP`, the request's two address bytes swapped, then the sentinel.
fn error_reply(request: &[u8]) -> Vec<u8> {
    let mut reply = Vec::with_capacity(Marker::LEN + 2 + ERROR_SENTINEL.len());
    if request.len() >= Marker::LEN + 2 && Marker::from_prefix(request).is_some() {
        reply.extend_from_slice(Marker::Current.as_bytes());
        reply.push(request[Marker::LEN + 1]);
        reply.push(request[Marker::LEN]);
    }
    reply.extend_from_slice(ERROR_SENTINEL);
    reply
}

pub fn run(args: EmulateArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = Device::new(&args.firmware)?;
    let socket =
        UdpTransport::bind(args.listen).map_err(|err| transport_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(listen = %socket.local_addr(), "emulator listening");

    let mut handled = 0usize;
    let mut buf = [0u8; 256];
    while running.load(Ordering::SeqCst) {
        let (n, from) = match socket.recv_from_timeout(&mut buf, POLL_INTERVAL) {
            Ok(Some(received)) => received,
            Ok(None) => continue,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("receive failed", err)),
        };

        let reply = device.respond(&buf[..n]);
        debug!(
            %from,
            recording = device.is_recording(),
            reply = %String::from_utf8_lossy(&reply),
            "replying"
        );
        socket
            .send_to(&reply, from)
            .map_err(|err| io_error("reply failed", err))?;

        handled = handled.saturating_add(1);
        if args.count.is_some_and(|count| handled >= count) {
            break;
        }
    }

    print_outcome(
        &Outcome::new("emulate", socket.local_addr(), format!("handled {handled}")),
        format,
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use gimbalctl_frame::command::{DZM, GIMBAL, PTZ, USER};
    use gimbalctl_frame::{build_fixed_frame, is_error_response, validate_address_echo, DEVICE};

    use super::*;

    fn device() -> Device {
        Device::new(DEFAULT_FIRMWARE).unwrap()
    }

    fn status_query() -> Vec<u8> {
        build_fixed_frame(USER, DEVICE, ControlType::Read, REC, 0x00)
            .as_bytes()
            .to_vec()
    }

    fn record(state: RecordState) -> Vec<u8> {
        build_fixed_frame(USER, DEVICE, ControlType::Write, REC, state.as_byte())
            .as_bytes()
            .to_vec()
    }

    #[test]
    fn status_reply_matches_device_format() {
        let mut device = device();
        assert_eq!(device.respond(&status_query()), b"#TPDU2rREC003E");

        device.respond(&record(RecordState::Start));
        assert!(device.is_recording());
        assert_eq!(device.respond(&status_query()), b"#TPDU2rREC013F");
    }

    #[test]
    fn toggle_flips_recording() {
        let mut device = device();
        device.respond(&record(RecordState::Toggle));
        assert!(device.is_recording());
        device.respond(&record(RecordState::Toggle));
        assert!(!device.is_recording());
    }

    #[test]
    fn firmware_query_returns_version_text() {
        let mut device = device();
        let query = build_fixed_frame(USER, DEVICE, ControlType::Read, VER, 0x00);
        let reply = device.respond(query.as_bytes());

        let decoded = decode_frame(&reply, AddressLayout::reply_to(&query)).unwrap();
        assert_eq!(decoded.payload_text(), DEFAULT_FIRMWARE);
        assert!(validate_address_echo(&query, &reply));
    }

    #[test]
    fn write_commands_echo_with_swapped_addresses() {
        let mut device = device();
        let zoom = build_fixed_frame(USER, GIMBAL, ControlType::Write, DZM, 0x01);
        assert_eq!(device.respond(zoom.as_bytes()), b"#TPGU2wDZM0158");
    }

    #[test]
    fn legacy_request_gets_legacy_reply() {
        let mut device = device();
        let request = build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, "05").unwrap();
        let reply = device.respond(request.as_bytes());

        assert!(reply.starts_with(b"#tpGU5wPTZ05"));
        assert!(validate_address_echo(&request, &reply));
        assert!(!is_error_response(&reply));
    }

    #[test]
    fn corrupt_request_gets_error_sentinel() {
        let mut device = device();
        assert_eq!(device.respond(b"#TPUG2wDZM0100"), b"#TPGUERE!!");
        assert_eq!(device.respond(b"garbage"), b"ERE!!");
    }

    #[test]
    fn unknown_identifier_gets_error_sentinel() {
        let mut device = device();
        let unknown = "XYZ".parse().unwrap();
        let request = build_fixed_frame(USER, GIMBAL, ControlType::Write, unknown, 0x01);
        assert!(is_error_response(&device.respond(request.as_bytes())));
    }

    #[test]
    fn unknown_record_state_rejected() {
        let mut device = device();
        let request = build_fixed_frame(USER, DEVICE, ControlType::Write, REC, 0x07);
        assert!(is_error_response(&device.respond(request.as_bytes())));
    }

    #[test]
    fn firmware_string_must_fit_one_frame() {
        assert_eq!(Device::new("too-long-1").unwrap_err().code, USAGE);
        assert!(Device::new("").is_err());
    }
}
