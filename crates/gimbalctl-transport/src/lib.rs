//! Datagram transport for gimbal control.
//!
//! Provides the socket seam the session layer talks to:
//! - [`DatagramSocket`], the send/receive/timeout capability set
//! - [`UdpTransport`], its implementation over `std::net::UdpSocket`
//!
//! This is the lowest layer of gimbalctl. Nothing here knows about frames.

pub mod error;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::DatagramSocket;
pub use udp::UdpTransport;
