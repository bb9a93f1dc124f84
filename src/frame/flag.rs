//! Fin flag and opcode.

use crate::error::FrameError;

/// Fin flag.
///
/// The three reserved bits share the high nibble. No extension is ever
/// negotiated, so any of them being set is rejected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fin {
    /// final fragment
    Y = 0x80,

    /// more fragments follow
    N = 0x00,
}

/// Frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// 0x00
    Continue = 0x00,
    /// 0x01
    Text = 0x01,
    /// 0x02
    Binary = 0x02,

    /// 0x08
    Close = 0x08,
    /// 0x09
    Ping = 0x09,
    /// 0x0a
    Pong = 0x0a,
}

impl Fin {
    /// Parse from the first header byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Result<Self, FrameError> {
        let fin = match b & 0xf0 {
            0x80 => Fin::Y,
            0x00 => Fin::N,
            _ => return Err(FrameError::IllegalFin),
        };
        Ok(fin)
    }
}

impl OpCode {
    /// Parse from the first header byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Result<Self, FrameError> {
        use OpCode::*;
        let opcode = match b & 0x0f {
            0x00 => Continue,
            0x01 => Text,
            0x02 => Binary,
            0x08 => Close,
            0x09 => Ping,
            0x0a => Pong,
            _ => return Err(FrameError::IllegalOpCode),
        };
        Ok(opcode)
    }

    /// Close, ping and pong.
    #[inline]
    pub const fn is_control(self) -> bool { (self as u8) & 0x08 != 0 }
}
