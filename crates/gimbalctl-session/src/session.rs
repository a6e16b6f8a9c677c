use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use gimbalctl_frame::{is_error_response, min_reply_len, validate_address_echo, Frame};
use gimbalctl_transport::{DatagramSocket, UdpTransport};
use tracing::{debug, error, info, warn};

use crate::error::{ProtocolError, Result, SessionError};

/// Receives a human-readable description of every socket failure.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Session behavior configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The device every command is sent to.
    pub peer: SocketAddr,
    /// How long [`Session::send_and_verify`] waits for a reply.
    pub verify_timeout: Duration,
    /// Receive buffer size; longer datagrams are truncated by the socket.
    pub recv_buffer_size: usize,
}

impl SessionConfig {
    /// Default device address.
    pub const DEFAULT_PEER: SocketAddr =
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 100), 5000));

    pub fn for_peer(peer: SocketAddr) -> Self {
        Self {
            peer,
            ..Self::default()
        }
    }

    /// Reject settings no call could honor.
    pub fn validate(&self) -> Result<()> {
        if self.verify_timeout.is_zero() {
            return Err(SessionError::InvalidConfig("verify timeout must be non-zero"));
        }
        if self.recv_buffer_size == 0 {
            return Err(SessionError::InvalidConfig("receive buffer size must be non-zero"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            peer: Self::DEFAULT_PEER,
            verify_timeout: Duration::from_millis(1000),
            recv_buffer_size: 256,
        }
    }
}

/// One controller's conversation with one device.
///
/// Owns the socket. Every call holds the socket lock from transmission until
/// its reply, timeout, or failure, so concurrent callers are served strictly
/// one at a time and a reply is only ever read by the call that is waiting
/// for it. Datagrams still queued from earlier calls are discarded before
/// each transmission.
pub struct Session<S = UdpTransport> {
    socket: Mutex<S>,
    config: SessionConfig,
    error_callback: Option<ErrorCallback>,
}

impl Session<UdpTransport> {
    /// Bind an ephemeral UDP port on all interfaces and talk to `config.peer`.
    pub fn connect(config: SessionConfig) -> Result<Self> {
        Self::bind(UdpTransport::DEFAULT_BIND, config)
    }

    /// Bind a UDP socket on `local` and talk to `config.peer`.
    pub fn bind(local: SocketAddr, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let socket = UdpTransport::bind(local)?;
        Self::with_socket(socket, config)
    }
}

impl<S: DatagramSocket> Session<S> {
    /// Wrap an already bound socket. Fails if `config` does not validate.
    pub fn with_socket(socket: S, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        info!(peer = %config.peer, "gimbal session ready");
        Ok(Self {
            socket: Mutex::new(socket),
            config,
            error_callback: None,
        })
    }

    /// Register a sink for socket failure descriptions.
    ///
    /// Consumes the session, so the callback is fixed before the first call.
    pub fn with_error_callback(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.error_callback = Some(Arc::new(callback));
        self
    }

    /// Transmit `frame` and return once the datagram is handed to the network.
    pub fn send_fire_and_forget(&self, frame: &Frame) -> Result<()> {
        let socket = self.lock();
        self.transmit(&*socket, frame)
    }

    /// Transmit `frame`, then wait up to `timeout` for any datagram.
    ///
    /// The reply content is not inspected. A zero `timeout` means "don't
    /// wait": success is returned right after transmission.
    pub fn send_with_timeout(&self, frame: &Frame, timeout: Duration) -> Result<()> {
        self.send_and_capture(frame, timeout).map(|_| ())
    }

    /// Transmit `frame`, then wait up to `timeout` and return the raw reply.
    ///
    /// With a zero `timeout` nothing is read and `Ok(None)` is returned.
    pub fn send_and_capture(&self, frame: &Frame, timeout: Duration) -> Result<Option<Bytes>> {
        let socket = self.lock();
        self.transmit(&*socket, frame)?;

        if timeout.is_zero() {
            return Ok(None);
        }

        self.await_reply(&*socket, timeout).map(Some)
    }

    /// Transmit `frame` and require a reply that confirms it.
    ///
    /// The reply must not carry the error sentinel, must be long enough to
    /// hold both address tokens, and must echo the addresses swapped. Waits
    /// at most [`SessionConfig::verify_timeout`].
    pub fn send_and_verify(&self, frame: &Frame) -> Result<()> {
        let reply = {
            let socket = self.lock();
            self.transmit(&*socket, frame)?;
            self.await_reply(&*socket, self.config.verify_timeout)?
        };

        verify_reply(frame, &reply).inspect_err(|err| {
            warn!(
                frame = %frame,
                reply = %String::from_utf8_lossy(&reply),
                error = %err,
                "reply rejected"
            );
        })?;

        debug!(frame = %frame, "command confirmed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn lock_socket_for_test(&self) -> MutexGuard<'_, S> {
        self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // The guarded socket has no invariant a panicking holder could break.
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transmit(&self, socket: &S, frame: &Frame) -> Result<()> {
        let stale = socket
            .discard_pending()
            .map_err(|err| self.socket_failure("discard failed", err))?;
        if stale > 0 {
            debug!(count = stale, "dropped stale replies");
        }

        socket
            .send_to(frame.as_bytes(), self.config.peer)
            .map_err(|err| self.socket_failure("send failed", err))?;
        debug!(peer = %self.config.peer, frame = %frame, "sent command");
        Ok(())
    }

    fn await_reply(&self, socket: &S, timeout: Duration) -> Result<Bytes> {
        let mut buf = vec![0u8; self.config.recv_buffer_size];
        match socket.recv_timeout(&mut buf, timeout) {
            Ok(Some(n)) => {
                buf.truncate(n);
                debug!(reply = %String::from_utf8_lossy(&buf), "received reply");
                Ok(Bytes::from(buf))
            }
            Ok(None) => {
                info!(?timeout, "no reply before timeout");
                Err(SessionError::Timeout(timeout))
            }
            Err(err) => Err(self.socket_failure("receive failed", err)),
        }
    }

    fn socket_failure(&self, context: &str, err: io::Error) -> SessionError {
        let description = format!("{context}: {err}");
        error!(peer = %self.config.peer, error = %description, "socket failure");
        if let Some(callback) = &self.error_callback {
            callback(&description);
        }
        SessionError::SocketFailure(err)
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("error_callback", &self.error_callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Reply checks for [`Session::send_and_verify`], in the order the device
/// firmware needs them: sentinel, length, address echo.
pub(crate) fn verify_reply(sent: &Frame, reply: &[u8]) -> std::result::Result<(), ProtocolError> {
    if is_error_response(reply) {
        return Err(ProtocolError::ErrorSentinel);
    }
    let min = min_reply_len(sent);
    if reply.len() < min {
        return Err(ProtocolError::TooShort {
            len: reply.len(),
            min,
        });
    }
    if !validate_address_echo(sent, reply) {
        return Err(ProtocolError::AddressMismatch);
    }
    Ok(())
}
