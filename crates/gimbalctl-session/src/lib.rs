//! Request/response session and high-level gimbal operations.
//!
//! [`Session`] owns the socket and the peer address and runs one
//! send/receive cycle at a time. [`Gimbal`] turns camera operations into
//! frames and picks the call shape each one needs.

pub mod error;
pub mod gimbal;
pub mod modes;
pub mod session;

pub use error::{ProtocolError, Result, SessionError};
pub use gimbal::{Gimbal, MEDIA_REPLY_TIMEOUT, QUERY_REPLY_TIMEOUT};
pub use modes::{
    ColorMode, GimbalAction, InstallMode, ParseModeError, RecordState, RecordingStatus, ZoomMode,
};
pub use session::{ErrorCallback, Session, SessionConfig};
