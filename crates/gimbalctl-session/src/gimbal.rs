use std::sync::Arc;
use std::time::Duration;

use gimbalctl_frame::command::{
    CAP, DEVICE, DZM, GAP, GAR, GAY, GIMBAL, GSP, GSY, IMG, PTZ, REC, USER, VER,
};
use gimbalctl_frame::{
    build_dynamic_frame, build_fixed_frame, build_legacy_frame, decode_frame, AddressLayout,
    ControlType, DecodedFrame, Frame, Identifier,
};
use gimbalctl_transport::{DatagramSocket, UdpTransport};
use tracing::info;

use crate::error::{ProtocolError, Result, SessionError};
use crate::modes::{ColorMode, GimbalAction, InstallMode, RecordState, RecordingStatus, ZoomMode};
use crate::session::{verify_reply, Session};

/// Reply window for recording, capture, zoom and palette commands.
pub const MEDIA_REPLY_TIMEOUT: Duration = Duration::from_millis(999);

/// Reply window for install mode and firmware queries.
pub const QUERY_REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

const ANGLE_LIMIT_DEG: f32 = 90.0;
const ANGLE_SPEED_MAX: f32 = 100.0;
const AXIS_SPEED_LIMIT: f32 = 127.0;

/// Placeholder payload byte for read commands.
const NO_DATA: u8 = 0x00;

/// High-level camera gimbal operations.
///
/// Clamps arguments, builds the frame each operation uses, and picks the
/// call shape the device supports for it. Cloning shares the session.
#[derive(Debug)]
pub struct Gimbal<S = UdpTransport> {
    session: Arc<Session<S>>,
}

impl<S> Clone for Gimbal<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: DatagramSocket> Gimbal<S> {
    pub fn new(session: Arc<Session<S>>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session<S>> {
        &self.session
    }

    /// Issue a base motion or calibration action and require confirmation.
    ///
    /// Uses the legacy text frame; the action byte travels as two lowercase
    /// hex characters.
    pub fn control_gimbal(&self, action: GimbalAction) -> Result<()> {
        let text = format!("{:02x}", action.as_byte());
        let frame = build_legacy_frame(USER, GIMBAL, ControlType::Write, PTZ, &text)?;
        info!(%action, cmd = %frame, "control gimbal");
        self.session.send_and_verify(&frame)
    }

    /// Point the gimbal. Angles are clamped to ±90°, `speed` to 0-100.
    ///
    /// Sends yaw, pitch and roll as three unconfirmed commands. All three go
    /// out even if one fails; the first failure is returned.
    pub fn set_angle(&self, yaw: f32, pitch: f32, roll: f32, speed: f32) -> Result<()> {
        let speed = speed.clamp(0.0, ANGLE_SPEED_MAX) as u8;

        let results = [(GAY, yaw), (GAP, pitch), (GAR, roll)].map(|(id, angle)| -> Result<()> {
            let frame = build_dynamic_frame(
                USER,
                GIMBAL,
                ControlType::Write,
                id,
                &angle_payload(angle, speed),
            )?;
            info!(cmd = %frame, "set angle");
            self.session.send_fire_and_forget(&frame)
        });

        results.into_iter().collect()
    }

    /// Set continuous yaw/pitch rotation speed, clamped to ±127.
    ///
    /// Speeds travel in half-degree steps, saturating at the signed byte range.
    pub fn set_speed(&self, yaw_speed: f32, pitch_speed: f32) -> Result<()> {
        let yaw = build_fixed_frame(USER, GIMBAL, ControlType::Write, GSY, speed_byte(yaw_speed));
        let pitch = build_fixed_frame(
            USER,
            GIMBAL,
            ControlType::Write,
            GSP,
            speed_byte(pitch_speed),
        );

        let yaw_result = self.session.send_fire_and_forget(&yaw);
        let pitch_result = self.session.send_fire_and_forget(&pitch);
        yaw_result.and(pitch_result)
    }

    pub fn control_recording(&self, state: RecordState) -> Result<()> {
        let frame = build_fixed_frame(USER, DEVICE, ControlType::Write, REC, state.as_byte());
        info!(%state, cmd = %frame, "control recording");
        self.session.send_with_timeout(&frame, MEDIA_REPLY_TIMEOUT)
    }

    /// Ask the device whether it is recording.
    pub fn recording_status(&self) -> Result<RecordingStatus> {
        let frame = build_fixed_frame(USER, DEVICE, ControlType::Read, REC, NO_DATA);
        info!(cmd = %frame, "query recording status");

        let reply = self.query(&frame, MEDIA_REPLY_TIMEOUT)?;
        let byte = reply.payload.first().ok_or(ProtocolError::MissingPayload)?;
        let status = RecordingStatus::from_byte(*byte);
        info!(%status, "recording status");
        Ok(status)
    }

    pub fn capture_photo(&self) -> Result<()> {
        let frame = build_fixed_frame(USER, DEVICE, ControlType::Write, CAP, 0x01);
        info!(cmd = %frame, "capture photo");
        self.session.send_with_timeout(&frame, MEDIA_REPLY_TIMEOUT)
    }

    pub fn set_zoom_mode(&self, mode: ZoomMode) -> Result<()> {
        let frame = build_fixed_frame(USER, GIMBAL, ControlType::Write, DZM, mode.as_byte());
        info!(%mode, cmd = %frame, "set zoom mode");
        self.session.send_with_timeout(&frame, MEDIA_REPLY_TIMEOUT)
    }

    pub fn set_color_mode(&self, mode: ColorMode) -> Result<()> {
        let frame = build_fixed_frame(USER, DEVICE, ControlType::Write, IMG, mode.as_byte());
        info!(%mode, cmd = %frame, "set thermal color mode");
        self.session.send_with_timeout(&frame, MEDIA_REPLY_TIMEOUT)
    }

    pub fn set_install_mode(&self, mode: InstallMode) -> Result<()> {
        let frame = build_fixed_frame(USER, GIMBAL, ControlType::Write, PTZ, mode.as_byte());
        info!(%mode, cmd = %frame, "set install mode");
        self.session.send_with_timeout(&frame, QUERY_REPLY_TIMEOUT)
    }

    /// Read the firmware version string from the payload of the reply.
    pub fn firmware_version(&self) -> Result<String> {
        let frame = build_fixed_frame(USER, DEVICE, ControlType::Read, VER, NO_DATA);
        info!(cmd = %frame, "query firmware version");

        let reply = self.query(&frame, QUERY_REPLY_TIMEOUT)?;
        Ok(reply.payload_text())
    }

    /// Capture one reply to `frame` and check it answers the same register.
    fn query(&self, frame: &Frame, timeout: Duration) -> Result<DecodedFrame> {
        let reply = self
            .session
            .send_and_capture(frame, timeout)?
            .ok_or(SessionError::Timeout(timeout))?;

        verify_reply(frame, &reply)?;
        let decoded = decode_frame(&reply, AddressLayout::reply_to(frame))
            .map_err(ProtocolError::Undecodable)?;
        check_identifier(frame.identifier(), decoded.identifier)?;
        Ok(decoded)
    }
}

fn check_identifier(expected: Identifier, actual: Identifier) -> Result<()> {
    if expected != actual {
        return Err(ProtocolError::IdentifierMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Angle in hundredths of a degree (big-endian, two's complement), then speed.
fn angle_payload(angle: f32, speed: u8) -> [u8; 3] {
    let centi = (angle.clamp(-ANGLE_LIMIT_DEG, ANGLE_LIMIT_DEG) * 100.0) as i16;
    let [high, low] = centi.to_be_bytes();
    [high, low, speed]
}

fn speed_byte(speed: f32) -> u8 {
    ((speed.clamp(-AXIS_SPEED_LIMIT, AXIS_SPEED_LIMIT) * 2.0) as i8) as u8
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    use gimbalctl_frame::{Address, Marker};

    use super::*;
    use crate::session::SessionConfig;

    /// Records sent frames and answers receives from a queue.
    #[derive(Default)]
    struct ScriptedDevice {
        sent: Mutex<Vec<String>>,
        waits: Mutex<Vec<Duration>>,
        replies: Mutex<VecDeque<Vec<u8>>>,
    }

    impl DatagramSocket for ScriptedDevice {
        fn send_to(&self, buf: &[u8], _addr: SocketAddr) -> io::Result<usize> {
            self.sent
                .lock()
                .unwrap()
                .push(String::from_utf8(buf.to_vec()).unwrap());
            Ok(buf.len())
        }

        fn recv(&self, _buf: &mut [u8]) -> io::Result<usize> {
            unreachable!()
        }

        fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
            self.waits.lock().unwrap().push(timeout);
            Ok(self.replies.lock().unwrap().pop_front().map(|reply| {
                buf[..reply.len()].copy_from_slice(&reply);
                reply.len()
            }))
        }

        fn discard_pending(&self) -> io::Result<usize> {
            Ok(0)
        }
    }

    fn gimbal(replies: &[&[u8]]) -> Gimbal<ScriptedDevice> {
        let device = ScriptedDevice {
            replies: Mutex::new(replies.iter().map(|r| r.to_vec()).collect()),
            ..ScriptedDevice::default()
        };
        let session = Session::with_socket(device, SessionConfig::default()).unwrap();
        Gimbal::new(Arc::new(session))
    }

    fn sent(gimbal: &Gimbal<ScriptedDevice>) -> Vec<String> {
        gimbal.session().lock_socket_for_test().sent.lock().unwrap().clone()
    }

    fn waits(gimbal: &Gimbal<ScriptedDevice>) -> Vec<Duration> {
        gimbal.session().lock_socket_for_test().waits.lock().unwrap().clone()
    }

    fn reply(source: Address, id: Identifier, control: ControlType, data: &[u8]) -> Vec<u8> {
        build_dynamic_frame(source, USER, control, id, data)
            .unwrap()
            .as_bytes()
            .to_vec()
    }

    #[test]
    fn set_angle_sends_three_unconfirmed_frames() {
        let gimbal = gimbal(&[]);
        gimbal.set_angle(90.0, -45.5, 0.0, 10.0).unwrap();

        let sent = sent(&gimbal);
        assert_eq!(sent.len(), 3);
        // 9000 = 0x2328, -4550 = 0xEE3A, speed 10 = 0x0A
        assert!(sent[0].starts_with("#TPUG6wGAY23280A"));
        assert!(sent[1].starts_with("#TPUG6wGAPEE3A0A"));
        assert!(sent[2].starts_with("#TPUG6wGAR00000A"));
        assert!(waits(&gimbal).is_empty());
    }

    #[test]
    fn set_angle_clamps_inputs() {
        let gimbal = gimbal(&[]);
        gimbal.set_angle(400.0, -400.0, 12.0, 250.0).unwrap();

        let sent = sent(&gimbal);
        assert!(sent[0].starts_with("#TPUG6wGAY232864"));
        assert!(sent[1].starts_with("#TPUG6wGAPDCD864"));
        assert!(sent[2].starts_with("#TPUG6wGAR04B064"));
    }

    #[test]
    fn set_speed_scales_and_saturates() {
        let gimbal = gimbal(&[]);
        gimbal.set_speed(10.0, -127.0).unwrap();

        let sent = sent(&gimbal);
        assert!(sent[0].starts_with("#TPUG2wGSY14"));
        assert!(sent[1].starts_with("#TPUG2wGSP80"));
    }

    #[test]
    fn speed_byte_values() {
        assert_eq!(speed_byte(0.0), 0x00);
        assert_eq!(speed_byte(10.0), 0x14);
        assert_eq!(speed_byte(-1.0), 0xFE);
        assert_eq!(speed_byte(127.0), 0x7F);
        assert_eq!(speed_byte(f32::NAN), 0x00);
    }

    #[test]
    fn media_commands_wait_for_any_reply() {
        let gimbal = gimbal(&[b"ack", b"ack", b"ack", b"ack"]);
        gimbal.control_recording(RecordState::Start).unwrap();
        gimbal.capture_photo().unwrap();
        gimbal.set_zoom_mode(ZoomMode::Zoom2x).unwrap();
        gimbal.set_color_mode(ColorMode::BlackHot).unwrap();

        let sent = sent(&gimbal);
        assert!(sent[0].starts_with("#TPUD2wREC01"));
        assert!(sent[1].starts_with("#TPUD2wCAP01"));
        assert!(sent[2].starts_with("#TPUG2wDZM01"));
        assert!(sent[3].starts_with("#TPUD2wIMG0B"));
        assert_eq!(waits(&gimbal), vec![MEDIA_REPLY_TIMEOUT; 4]);
    }

    #[test]
    fn install_mode_times_out_without_reply() {
        let gimbal = gimbal(&[]);
        let err = gimbal.set_install_mode(InstallMode::Reverse).unwrap_err();
        assert!(err.is_timeout());
        assert!(sent(&gimbal)[0].starts_with("#TPUG2wPTZ0B"));
        assert_eq!(waits(&gimbal), vec![QUERY_REPLY_TIMEOUT]);
    }

    #[test]
    fn recording_status_reads_payload() {
        let gimbal = gimbal(&[b"#TPDU2rREC013F", b"#TPDU2rREC003E"]);
        assert_eq!(gimbal.recording_status().unwrap(), RecordingStatus::Recording);
        assert_eq!(gimbal.recording_status().unwrap(), RecordingStatus::Idle);
        assert_eq!(sent(&gimbal)[0], "#TPUD2rREC003E");
    }

    #[test]
    fn recording_status_rejects_foreign_reply() {
        let gimbal = gimbal(&[b"#TPGU2rREC013F"]);
        let err = gimbal.recording_status().unwrap_err();
        assert!(matches!(err, SessionError::Protocol(ProtocolError::AddressMismatch)));
    }

    #[test]
    fn recording_status_rejects_wrong_identifier() {
        let other = reply(DEVICE, VER, ControlType::Read, &[0x01]);
        let gimbal = gimbal(&[&other]);
        let err = gimbal.recording_status().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolError::IdentifierMismatch { .. })
        ));
    }

    #[test]
    fn recording_status_requires_status_byte() {
        let empty = reply(DEVICE, REC, ControlType::Read, &[]);
        let gimbal = gimbal(&[&empty]);
        let err = gimbal.recording_status().unwrap_err();
        assert!(matches!(err, SessionError::Protocol(ProtocolError::MissingPayload)));
    }

    #[test]
    fn recording_status_rejects_corrupt_reply() {
        let gimbal = gimbal(&[b"#TPDU2rREC0199"]);
        let err = gimbal.recording_status().unwrap_err();
        assert!(matches!(err, SessionError::Protocol(ProtocolError::Undecodable(_))));
    }

    #[test]
    fn firmware_version_returns_payload_text() {
        let version = reply(DEVICE, VER, ControlType::Read, b"1.4.2");
        let gimbal = gimbal(&[&version]);
        assert_eq!(gimbal.firmware_version().unwrap(), "1.4.2");
        let query = build_fixed_frame(USER, DEVICE, ControlType::Read, VER, 0);
        assert_eq!(sent(&gimbal)[0], query.as_str());
    }

    #[test]
    fn control_gimbal_uses_legacy_frame_and_verifies() {
        let ack = build_legacy_frame(GIMBAL, USER, ControlType::Write, PTZ, "05").unwrap();
        let gimbal = gimbal(&[ack.as_bytes(), b"#tpGUERE!!"]);

        gimbal.control_gimbal(GimbalAction::Center).unwrap();
        let sent_frames = sent(&gimbal);
        assert!(sent_frames[0].starts_with("#tpUG5wPTZ05"));
        assert_eq!(Marker::from_prefix(sent_frames[0].as_bytes()), Some(Marker::Legacy));

        let err = gimbal.control_gimbal(GimbalAction::Stop).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(ProtocolError::ErrorSentinel)));
    }

    #[test]
    fn clones_share_one_session() {
        let gimbal = gimbal(&[]);
        let other = gimbal.clone();
        assert!(Arc::ptr_eq(gimbal.session(), other.session()));
    }
}
