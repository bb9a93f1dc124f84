//! Websocket handshake.
//!
//! Only the server half: parse the client's upgrade request, answer with
//! `101 Switching Protocols`, or turn the connection away with a short
//! error response.

pub mod key;
pub mod request;
pub mod response;

pub use request::Request;
pub use response::{Reject, Response};
pub use key::derive_accept_key;

/// 32
pub const MAX_ALLOW_HEADERS: usize = 32;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// GET
pub const HTTP_METHOD: &[u8] = b"GET";

/// CRLF
pub const HTTP_LINE_BREAK: &[u8] = b"\r\n";

/// A colon + one SP is prefered
pub const HTTP_HEADER_SP: &[u8] = b": ";

/// HTTP/1.1 101 Switching Protocols
pub const HTTP_STATUS_LINE: &[u8] = b"HTTP/1.1 101 Switching Protocols";

macro_rules! header {
    (   $(
            ($hdr_name: ident => $name: expr);
        )+
    ) => {
        $(
            pub const $hdr_name: &[u8] = $name;
        )+
    };
}

macro_rules! write_header {
    ($w: expr, $name: expr, $value: expr) => {{
        let full = || HandshakeError::NotEnoughCapacity;
        $w.write_or_err($name, full)?;
        $w.write_or_err(HTTP_HEADER_SP, full)?;
        $w.write_or_err($value, full)?;
        $w.write_or_err(HTTP_LINE_BREAK, full)?;
    }};
}

pub(self) use write_header;

/// Static http headers
#[allow(unused)]
pub mod static_headers {
    // header name
    header! {
        (HEADER_HOST_NAME => b"host");

        (HEADER_UPGRADE_NAME => b"upgrade");

        (HEADER_CONNECTION_NAME => b"connection");

        (HEADER_CONTENT_LENGTH_NAME => b"content-length");

        (HEADER_SEC_WEBSOCKET_KEY_NAME => b"sec-websocket-key");

        (HEADER_SEC_WEBSOCKET_ACCEPT_NAME => b"sec-websocket-accept");

        (HEADER_SEC_WEBSOCKET_VERSION_NAME => b"sec-websocket-version");
    }

    // header value
    header! {
        (HEADER_UPGRADE_VALUE => b"websocket");

        (HEADER_CONNECTION_VALUE => b"upgrade");

        (HEADER_CONNECTION_CLOSE_VALUE => b"close");

        (HEADER_SEC_WEBSOCKET_VERSION_VALUE => b"13");
    }
}
