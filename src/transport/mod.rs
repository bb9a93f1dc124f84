//! Transport seam.
//!
//! The server only needs non-blocking accept, read and write. A read or
//! accept that would block is the "not ready" answer of a zero-timeout
//! poll, so `update()` never waits on the network.

use std::io::{Read, Write, Result};
use std::net::SocketAddr;

cfg_if::cfg_if! {
    if #[cfg(feature = "tcp")] {
        mod tcp;
        pub use tcp::bind;
    }
}

/// A listening socket.
pub trait Listener {
    type Conn: Connection;

    /// Accept one pending connection, `Ok(None)` if there is none.
    fn accept(&mut self) -> Result<Option<(Self::Conn, SocketAddr)>>;

    fn local_addr(&self) -> Result<SocketAddr>;
}

/// An accepted connection.
///
/// `read` and `write` follow std semantics for non-blocking sockets:
/// `ErrorKind::WouldBlock` means not ready, `Ok(0)` from `read` means the
/// peer is gone.
pub trait Connection: Read + Write {
    /// Release the connection. Errors are ignored, the slot is
    /// reset either way.
    fn close(&mut self);
}
