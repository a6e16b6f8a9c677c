//! Command/response control of TP-protocol camera gimbals.
//!
//! gimbalctl speaks the checksummed ASCII frame protocol used by camera
//! gimbals over UDP: it builds and checks frames, runs one serialized
//! request/response cycle at a time, and exposes the gimbal operations
//! (pointing, speed, recording, capture, zoom, thermal palette).
//!
//! # Crate Structure
//!
//! - [`transport`]: datagram socket seam and UDP implementation
//! - [`frame`]: frame codec, identifier catalogue and reply checks
//! - [`session`]: serialized call shapes and high-level gimbal operations

/// Re-export transport types.
pub mod transport {
    pub use gimbalctl_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gimbalctl_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use gimbalctl_session::*;
}
