use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// The socket capabilities the session layer needs from a datagram transport.
///
/// Implementations take `&self` so a socket can be shared or mocked freely;
/// the session provides the mutual exclusion around each send/receive cycle.
pub trait DatagramSocket {
    /// Send one datagram to `addr`. Returns the number of bytes handed to the network.
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Block until a datagram arrives and copy it into `buf`.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Wait at most `timeout` for a datagram.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. `timeout` must be non-zero.
    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;

    /// Drop every datagram already queued on the socket without blocking.
    ///
    /// Returns how many datagrams were discarded.
    fn discard_pending(&self) -> io::Result<usize>;
}
