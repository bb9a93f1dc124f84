use std::io::{ErrorKind, Result};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use super::{Connection, Listener};

impl Listener for TcpListener {
    type Conn = TcpStream;

    fn accept(&mut self) -> Result<Option<(TcpStream, SocketAddr)>> {
        match TcpListener::accept(self) {
            Ok((stream, addr)) => {
                // accepted sockets do not inherit non-blocking mode everywhere
                stream.set_nonblocking(true)?;
                stream.set_nodelay(true)?;
                Ok(Some((stream, addr)))
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn local_addr(&self) -> Result<SocketAddr> { TcpListener::local_addr(self) }
}

impl Connection for TcpStream {
    fn close(&mut self) { let _ = self.shutdown(Shutdown::Both); }
}

/// Bind a non-blocking listener on every interface.
pub fn bind(port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}
