//! Websocket data frame.
//!
//! [RFC-6455 Section5](https://datatracker.ietf.org/doc/html/rfc6455#section-5)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data continued ...                |
//! +---------------------------------------------------------------+
//! ```
//!
//! Only the subset a small server needs: outgoing frames are always final
//! and unmasked with at most a 16-bit length; incoming frames must be
//! masked, unfragmented, and short enough for a 16-bit length.

pub mod flag;
pub mod length;
pub mod mask;

pub use flag::{Fin, OpCode};
pub use length::PayloadLen;
pub use mask::Mask;

use length::LenFlag;
use mask::apply_mask4;

use crate::buf::{Reader, Writer};
use crate::error::FrameError;

/// Longest head this server writes: 2 bytes + 16-bit length.
pub const MAX_SERVER_HEAD_LEN: usize = 2 + 2;

/// Longest head a client may send us: 2 bytes + 16-bit length + mask key.
pub const MAX_CLIENT_HEAD_LEN: usize = 2 + 2 + 4;

/// Longest payload of a control frame.
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// Websocket frame head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub fin: Fin,
    pub opcode: OpCode,
    pub mask: Mask,
    pub length: PayloadLen,
}

impl FrameHead {
    /// Constructor.
    #[inline]
    pub const fn new(fin: Fin, opcode: OpCode, mask: Mask, length: PayloadLen) -> Self {
        Self {
            fin,
            opcode,
            mask,
            length,
        }
    }

    /// Encode to provided buffer, returns the count of written bytes.
    /// The caller should ensure the buffer is large enough,
    /// otherwise a [`FrameError::NotEnoughCapacity`] error will be returned.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let mut w = Writer::new(buf);
        let full = || FrameError::NotEnoughCapacity;

        // fin, opcode
        let b1 = self.fin as u8 | self.opcode as u8;

        // mask, payload length
        let b2 = self.mask.to_flag() | self.length.to_flag();

        w.write_or_err(&[b1, b2], full)?;

        // extended payload length
        if let PayloadLen::Extended(v) = self.length {
            w.write_or_err(&v.to_be_bytes(), full)?;
        }

        // mask key
        if let Mask::Key(k) = self.mask {
            w.write_or_err(&k, full)?;
        }

        Ok(w.pos())
    }

    /// Parse from provided buffer, returns [`FrameHead`] and the count of read bytes
    /// if the parse succeeds.
    /// If there is not enough data to parse, a [`FrameError::NotEnoughData`] error
    /// will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), FrameError> {
        let mut r = Reader::new(buf);
        let short = || FrameError::NotEnoughData;

        // fin, opcode
        let b1 = r.read_u8().ok_or_else(short)?;

        // mask, payload length
        let b2 = r.read_u8().ok_or_else(short)?;

        let fin = Fin::from_flag(b1)?;
        let opcode = OpCode::from_flag(b1)?;

        let length = match PayloadLen::from_flag(b2) {
            LenFlag::Standard(n) => PayloadLen::Standard(n),
            LenFlag::Extended => PayloadLen::from_byte2(r.read_array().ok_or_else(short)?),
            LenFlag::Extended64 => return Err(FrameError::UnsupportedLength),
        };

        let mask = if Mask::is_set(b2) {
            Mask::Key(r.read_array().ok_or_else(short)?)
        } else {
            Mask::None
        };

        Ok((
            FrameHead {
                fin,
                opcode,
                mask,
                length,
            },
            r.pos(),
        ))
    }
}

/// A complete, unmasked frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub opcode: OpCode,
    pub payload: &'a [u8],
}

/// Outcome of [`decode`].
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// The buffer holds the start of a frame, keep reading.
    Incomplete,

    /// A whole frame, and how many bytes of the buffer it used.
    Complete { frame: Frame<'a>, consumed: usize },
}

/// Encode a final, unmasked server frame into `out`, returning its length.
pub fn encode(payload: &[u8], opcode: OpCode, out: &mut [u8]) -> Result<usize, FrameError> {
    let head = FrameHead::new(Fin::Y, opcode, Mask::None, PayloadLen::from_num(payload.len())?);
    let n = head.encode(out)?;

    let mut w = Writer::new(&mut out[n..]);
    w.write_or_err(payload, || FrameError::NotEnoughCapacity)?;

    Ok(n + payload.len())
}

/// Decode one client frame from the front of `buf`.
///
/// A frame longer than `limit` bytes in total is refused as soon as its
/// head is readable, whatever has arrived of it so far.
///
/// The payload is unmasked in place, so a buffer must not be decoded
/// twice once a frame has been returned from it.
pub fn decode(buf: &mut [u8], limit: usize) -> Result<Decoded<'_>, FrameError> {
    // refuse an unmasked frame as soon as its second byte is visible
    if let Some(&b2) = buf.get(1) {
        if !Mask::is_set(b2) {
            return Err(FrameError::IllegalMask);
        }
    }

    let (head, head_len) = match FrameHead::decode(buf) {
        Ok(x) => x,
        Err(FrameError::NotEnoughData) => return Ok(Decoded::Incomplete),
        Err(e) => return Err(e),
    };

    let key = match head.mask {
        Mask::Key(k) => k,
        Mask::None => return Err(FrameError::IllegalMask),
    };

    let len = head.length.to_num();

    if head.opcode.is_control() {
        if head.fin != Fin::Y || len > MAX_CONTROL_PAYLOAD {
            return Err(FrameError::IllegalControl);
        }
    } else if head.fin != Fin::Y || head.opcode == OpCode::Continue {
        return Err(FrameError::Fragmented);
    }

    let total = head_len + len;
    if total > limit {
        return Err(FrameError::ExceedsLimit);
    }
    if buf.len() < total {
        return Ok(Decoded::Incomplete);
    }

    let payload = &mut buf[head_len..total];
    apply_mask4(key, payload);

    Ok(Decoded::Complete {
        frame: Frame {
            opcode: head.opcode,
            payload,
        },
        consumed: total,
    })
}
