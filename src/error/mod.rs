#![allow(missing_docs)]
//! Errors
//!
//! Nothing here is fatal to the server. Transport and protocol errors close
//! the affected connection, capacity errors are counted and handed back to
//! the producer.

mod frame;
mod capacity;
mod command;
mod handshake;

pub use frame::FrameError;
pub use capacity::CapacityError;
pub use command::CommandError;
pub use handshake::HandshakeError;

use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Frame(FrameError),

    Handshake(HandshakeError),

    Capacity(CapacityError),

    Command(CommandError),

    Config(&'static str),

    Encode(serde_json::Error),

    Io(std::io::Error),
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self { Error::Frame(e) }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self { Error::Handshake(e) }
}

impl From<CapacityError> for Error {
    fn from(e: CapacityError) -> Self { Error::Capacity(e) }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self { Error::Command(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error { Error::Io(e) }
}

impl From<serde_json::Error> for Error {
    /// Running out of room while serializing into a fixed buffer
    /// shows up as an io error from serde_json.
    fn from(e: serde_json::Error) -> Error {
        if e.is_io() {
            Error::Capacity(CapacityError::PayloadTooLarge)
        } else {
            Error::Encode(e)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Error::*;
        match self {
            Frame(e) => write!(f, "Frame error: {}", e),
            Handshake(e) => write!(f, "Handshake error: {}", e),
            Capacity(e) => write!(f, "Capacity error: {}", e),
            Command(e) => write!(f, "Command error: {}", e),
            Config(e) => write!(f, "Config error: {}", e),
            Encode(e) => write!(f, "Encode error: {}", e),
            Io(e) => write!(f, "Io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Frame(e) => Some(e),
            Handshake(e) => Some(e),
            Capacity(e) => Some(e),
            Command(e) => Some(e),
            Config(_) => None,
            Encode(e) => Some(e),
            Io(e) => Some(e),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
