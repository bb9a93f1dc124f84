//! Payload length.

use crate::error::FrameError;

/// Payload length.
///
/// 7 bits, or 7+16 bits. The 7+64 form is recognized on the wire only to
/// be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLen {
    /// 0 - 125
    Standard(u8),
    /// 126 - 65535
    Extended(u16),
}

/// What the 7-bit length field announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LenFlag {
    Standard(u8),
    Extended,
    Extended64,
}

impl PayloadLen {
    /// Parse from number.
    /// Lengths that need a 64-bit field yield [`FrameError::FrameTooLarge`].
    #[inline]
    pub const fn from_num(n: usize) -> Result<Self, FrameError> {
        if n < 126 {
            Ok(PayloadLen::Standard(n as u8))
        } else if n < 65536 {
            Ok(PayloadLen::Extended(n as u16))
        } else {
            Err(FrameError::FrameTooLarge)
        }
    }

    /// Convert to number.
    #[inline]
    pub const fn to_num(self) -> usize {
        match self {
            PayloadLen::Standard(v) => v as usize,
            PayloadLen::Extended(v) => v as usize,
        }
    }

    /// Generate the flag byte.
    /// If `length <= 125`, it represents the real length.
    #[inline]
    pub const fn to_flag(self) -> u8 {
        match self {
            PayloadLen::Standard(b) => b,
            PayloadLen::Extended(_) => 126,
        }
    }

    /// Read the flag which indicates the kind of length.
    #[inline]
    pub(crate) const fn from_flag(b: u8) -> LenFlag {
        match b & 0x7f {
            126 => LenFlag::Extended,
            127 => LenFlag::Extended64,
            b => LenFlag::Standard(b),
        }
    }

    /// Read as 16-bit length.
    #[inline]
    pub const fn from_byte2(buf: [u8; 2]) -> Self { PayloadLen::Extended(u16::from_be_bytes(buf)) }
}
