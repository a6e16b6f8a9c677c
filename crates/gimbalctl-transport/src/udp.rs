use std::io::{self, ErrorKind};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::DatagramSocket;

/// UDP datagram transport.
///
/// Wraps an unconnected `UdpSocket` bound to a local address. Replies are
/// accepted from any sender; address checks belong to the protocol layer.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Default local bind address: any interface, ephemeral port.
    pub const DEFAULT_BIND: SocketAddr =
        SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, 0));

    /// Bind a socket on `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|e| TransportError::Bind { addr, source: e })?;
        let local_addr = socket.local_addr()?;

        info!(%local_addr, "bound udp socket");

        Ok(Self { socket, local_addr })
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive one datagram and report its sender (blocking).
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.set_read_timeout(None)?;
        self.socket.recv_from(buf)
    }

    /// Wait at most `timeout` for a datagram and report its sender.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. `timeout` must be non-zero.
    pub fn recv_from_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> io::Result<Option<(usize, SocketAddr)>> {
        if timeout.is_zero() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "receive timeout must be non-zero",
            ));
        }

        self.socket.set_read_timeout(Some(timeout))?;
        match self.socket.recv_from(buf) {
            Ok((n, from)) => {
                debug!(%from, size = n, "received datagram");
                Ok(Some((n, from)))
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl DatagramSocket for UdpTransport {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        let sent = self.socket.send_to(buf, addr)?;
        debug!(%addr, size = sent, "sent datagram");
        Ok(sent)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let (n, from) = self.recv_from(buf)?;
        debug!(%from, size = n, "received datagram");
        Ok(n)
    }

    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        Ok(self.recv_from_timeout(buf, timeout)?.map(|(n, _)| n))
    }

    fn discard_pending(&self) -> io::Result<usize> {
        self.socket.set_nonblocking(true)?;

        let mut scratch = [0u8; 512];
        let mut discarded = 0usize;
        let result = loop {
            match self.socket.recv_from(&mut scratch) {
                Ok((n, from)) => {
                    debug!(%from, size = n, "discarding stale datagram");
                    discarded += 1;
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break Ok(discarded),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => break Err(err),
            }
        };

        self.socket.set_nonblocking(false)?;
        result
    }
}
