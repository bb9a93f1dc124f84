//! Server handshake.
//!
//! From [RFC-6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2):
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! upgrade: websocket
//! connection: upgrade
//! sec-websocket-accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!
//! A refused connection gets one of the [`Reject`] responses and is
//! closed right after.

use super::write_header;
use super::{HTTP_STATUS_LINE, HTTP_LINE_BREAK, HTTP_HEADER_SP};
use super::static_headers::*;

use crate::buf::Writer;
use crate::error::HandshakeError;

/// Http response presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'b> {
    pub sec_accept: &'b [u8],
}

impl<'b> Response<'b> {
    /// Encode to a provided buffer, return the number of written bytes.
    ///
    /// Caller should make sure the buffer is large enough,
    /// otherwise a [`HandshakeError::NotEnoughCapacity`] error will be returned.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, HandshakeError> {
        let mut w = Writer::new(buf);
        let full = || HandshakeError::NotEnoughCapacity;

        // HTTP/1.1 101 Switching Protocols
        w.write_or_err(HTTP_STATUS_LINE, full)?;
        w.write_or_err(HTTP_LINE_BREAK, full)?;

        // upgrade: websocket
        write_header!(w, HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE);

        // connection: upgrade
        write_header!(w, HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE);

        // sec-websocket-accept: {sec_accept}
        write_header!(w, HEADER_SEC_WEBSOCKET_ACCEPT_NAME, self.sec_accept);

        // finish with CRLF
        w.write_or_err(HTTP_LINE_BREAK, full)?;

        Ok(w.pos())
    }
}

/// Error responses sent before closing a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    /// 400, malformed request or missing key
    BadRequest,

    /// 426, not an upgrade request or an unsupported version
    UpgradeRequired,

    /// 431, the request does not fit in the receive buffer
    HeaderTooLarge,

    /// 503, every client slot is taken
    Busy,
}

impl Reject {
    /// Pick the response for a failed handshake.
    pub const fn from_error(e: &HandshakeError) -> Self {
        match e {
            HandshakeError::Upgrade | HandshakeError::SecWebSocketVersion => {
                Reject::UpgradeRequired
            }
            HandshakeError::NotEnoughCapacity => Reject::HeaderTooLarge,
            _ => Reject::BadRequest,
        }
    }

    pub const fn status_line(self) -> &'static [u8] {
        match self {
            Reject::BadRequest => b"HTTP/1.1 400 Bad Request",
            Reject::UpgradeRequired => b"HTTP/1.1 426 Upgrade Required",
            Reject::HeaderTooLarge => b"HTTP/1.1 431 Request Header Fields Too Large",
            Reject::Busy => b"HTTP/1.1 503 Service Unavailable",
        }
    }

    /// Encode to a provided buffer, return the number of written bytes.
    pub fn encode(self, buf: &mut [u8]) -> Result<usize, HandshakeError> {
        let mut w = Writer::new(buf);
        let full = || HandshakeError::NotEnoughCapacity;

        w.write_or_err(self.status_line(), full)?;
        w.write_or_err(HTTP_LINE_BREAK, full)?;

        if self == Reject::UpgradeRequired {
            write_header!(w, HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE);
            write_header!(
                w,
                HEADER_SEC_WEBSOCKET_VERSION_NAME,
                HEADER_SEC_WEBSOCKET_VERSION_VALUE
            );
        }

        write_header!(w, HEADER_CONNECTION_NAME, HEADER_CONNECTION_CLOSE_VALUE);
        write_header!(w, HEADER_CONTENT_LENGTH_NAME, b"0");

        w.write_or_err(HTTP_LINE_BREAK, full)?;

        Ok(w.pos())
    }
}
