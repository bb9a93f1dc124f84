//! Client upgrade request.
//!
//! From [RFC-6455 Section 4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-4.1):
//!
//! Once a connection to the server has been established (including a
//! connection via a proxy or over a TLS-encrypted tunnel), the client
//! MUST send an opening handshake to the server.  The handshake consists
//! of an HTTP Upgrade request, along with a list of required and
//! optional header fields.
//!
//! Example:
//!
//! ```text
//! GET /path HTTP/1.1
//! host: www.example.com
//! upgrade: websocket
//! connection: upgrade
//! sec-websocket-key: dGhlIHNhbXBsZSBub25jZQ==
//! sec-websocket-version: 13
//! ```
//!
//! Browsers send `connection: keep-alive, Upgrade` and plenty of other
//! headers, so only `upgrade` and `sec-websocket-key` are mandatory here.
//! A `sec-websocket-version` other than 13 is refused.

use super::MAX_ALLOW_HEADERS;
use super::HTTP_METHOD;
use super::static_headers::*;

use crate::error::HandshakeError;

/// Http request presentation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Request<'b> {
    pub path: &'b [u8],
    pub host: &'b [u8],
    pub sec_key: &'b [u8],
}

impl<'b> Request<'b> {
    /// Create with all fields left empty.
    #[inline]
    pub const fn new() -> Self {
        Self {
            path: b"",
            host: b"",
            sec_key: b"",
        }
    }

    /// Parse from a provided buffer, save the results, and
    /// return the number of bytes parsed.
    ///
    /// If the buffer does not contain a complete http request,
    /// a [`HandshakeError::NotEnoughData`] error will be returned.
    /// If the required headers do not pass the check
    /// (case insensitive), other corresponding errors will be returned.
    pub fn decode(&mut self, buf: &'b [u8]) -> Result<usize, HandshakeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_ALLOW_HEADERS];
        let mut request = httparse::Request::new(&mut headers);

        // return value
        let decode_n = match request.parse(buf)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(HandshakeError::NotEnoughData),
        };

        // check method
        if request.method.map(str::as_bytes) != Some(HTTP_METHOD) {
            return Err(HandshakeError::HttpMethod);
        }

        // check version, should be HTTP/1.1
        // ref: https://docs.rs/httparse/latest/src/httparse/lib.rs.html#581-596
        if request.version != Some(1_u8) {
            return Err(HandshakeError::HttpVersion);
        }

        let mut host: &[u8] = b"";
        let mut upgrade: &[u8] = b"";
        let mut sec_key: &[u8] = b"";
        let mut sec_version: Option<&[u8]> = None;

        for hdr in request.headers.iter() {
            let name = hdr.name.as_bytes();
            let value = trim(hdr.value);

            if name.eq_ignore_ascii_case(HEADER_HOST_NAME) {
                host = value;
            } else if name.eq_ignore_ascii_case(HEADER_UPGRADE_NAME) {
                upgrade = value;
            } else if name.eq_ignore_ascii_case(HEADER_SEC_WEBSOCKET_KEY_NAME) {
                sec_key = value;
            } else if name.eq_ignore_ascii_case(HEADER_SEC_WEBSOCKET_VERSION_NAME) {
                sec_version = Some(value);
            }
        }

        // header value here is case insensitive
        // ref: https://datatracker.ietf.org/doc/html/rfc6455#section-4.1
        if !upgrade.eq_ignore_ascii_case(HEADER_UPGRADE_VALUE) {
            return Err(HandshakeError::Upgrade);
        }

        if sec_key.is_empty() {
            return Err(HandshakeError::SecWebSocketKey);
        }

        if let Some(v) = sec_version {
            if v != HEADER_SEC_WEBSOCKET_VERSION_VALUE {
                return Err(HandshakeError::SecWebSocketVersion);
            }
        }

        // save ref
        self.path = request.path.map(str::as_bytes).unwrap_or(&b"/"[..]);
        self.host = host;
        self.sec_key = sec_key;

        Ok(decode_n)
    }
}

#[inline]
fn trim(mut v: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = v {
        if !first.is_ascii_whitespace() {
            break;
        }
        v = rest;
    }
    while let [rest @ .., last] = v {
        if !last.is_ascii_whitespace() {
            break;
        }
        v = rest;
    }
    v
}
