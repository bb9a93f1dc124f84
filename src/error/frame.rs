use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// reserved bits set, no extension is negotiated
    IllegalFin,

    /// client frame without a mask
    IllegalMask,

    IllegalOpCode,

    /// 64-bit payload length
    UnsupportedLength,

    /// control frame longer than 125 bytes, or not final
    IllegalControl,

    /// continuation frame, or a data frame with fin clear
    Fragmented,

    /// payload does not fit in a 16-bit length
    FrameTooLarge,

    /// announced frame is longer than the receive buffer
    ExceedsLimit,

    NotEnoughData,

    NotEnoughCapacity,
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use FrameError::*;
        match self {
            IllegalFin => write!(f, "Illegal fin or reserved bits"),
            IllegalMask => write!(f, "Client frame is not masked"),
            IllegalOpCode => write!(f, "Illegal opcode value"),
            UnsupportedLength => write!(f, "64-bit payload length is not supported"),
            IllegalControl => write!(f, "Illegal control frame"),
            Fragmented => write!(f, "Fragmented messages are not supported"),
            FrameTooLarge => write!(f, "Payload exceeds 65535 bytes"),
            ExceedsLimit => write!(f, "Frame exceeds the receive buffer"),
            NotEnoughData => write!(f, "Not enough data to parse"),
            NotEnoughCapacity => write!(f, "Not enough space to write to"),
        }
    }
}

// use default impl
impl std::error::Error for FrameError {}
