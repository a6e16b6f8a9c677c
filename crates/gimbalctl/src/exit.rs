use std::fmt;
use std::io;

use gimbalctl_frame::FrameError;
use gimbalctl_session::SessionError;
use gimbalctl_transport::TransportError;

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
/// The command went out but the reply did not confirm it.
pub const PROTOCOL: i32 = 65;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        // ICMP port unreachable from the device host.
        io::ErrorKind::ConnectionRefused => FAILURE,
        io::ErrorKind::InvalidInput => USAGE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, addr } => {
            io_error(&format!("{context}: bind {addr}"), source)
        }
        TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match err {
        FrameError::InvalidPayloadLength { .. } | FrameError::InvalidPayloadText => DATA_INVALID,
        FrameError::InvalidAddress(_) | FrameError::InvalidIdentifier(_) => USAGE,
        _ => PROTOCOL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::SocketFailure(source) => io_error(context, source),
        SessionError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::Protocol(_) => CliError::new(PROTOCOL, format!("{context}: {err}")),
    }
}
