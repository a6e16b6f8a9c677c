use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Setting up the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] gimbalctl_transport::TransportError),

    /// The session configuration is unusable. Raised before any I/O.
    #[error("invalid session config: {0}")]
    InvalidConfig(&'static str),

    /// The command could not be encoded. Raised before any I/O.
    #[error("frame error: {0}")]
    Frame(#[from] gimbalctl_frame::FrameError),

    /// The socket failed while sending or receiving.
    #[error("socket failure: {0}")]
    SocketFailure(#[source] std::io::Error),

    /// No reply arrived within the bound.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// A reply arrived but does not confirm the command.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// True when the command went out but was not confirmed.
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self, SessionError::Timeout(_) | SessionError::Protocol(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout(_))
    }
}

/// Ways a reply can fail to confirm a command.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The reply carries the device error sentinel.
    #[error("device reported an error (ERE!!)")]
    ErrorSentinel,

    /// The reply is too short to hold both address tokens.
    #[error("reply too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },

    /// The reply is not addressed back to the sender.
    #[error("reply addresses do not echo the command")]
    AddressMismatch,

    /// The reply could not be decoded as a frame.
    #[error("undecodable reply: {0}")]
    Undecodable(#[source] gimbalctl_frame::FrameError),

    /// A query reply carries no payload to read.
    #[error("reply carries no payload")]
    MissingPayload,

    /// The reply answers a different identifier.
    #[error("reply identifier {actual} does not match {expected}")]
    IdentifierMismatch { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, SessionError>;
