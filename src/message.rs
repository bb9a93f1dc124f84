//! Outgoing application messages.
//!
//! Every message is one text frame carrying a json object tagged by
//! `type`:
//!
//! ```text
//! {"type":"log","level":"info","source":"wifi","message":"connected"}
//! {"type":"channel_data","channel":1,"voltage":12.05,"current":0.25}
//! {"type":"status","channels":[true,false,true,true],"voltage":12.05,...}
//! ```

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::config::CHANNELS;

/// Index of a slot in the client table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClientId(pub usize);

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "#{}", self.0) }
}

/// Who receives a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// every open client
    All,

    /// one client, skipped if it is gone by the time the queue drains
    Client(ClientId),
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<log::Level> for Level {
    fn from(l: log::Level) -> Self {
        match l {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

/// One sample of a diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub voltage: f32,
    pub current: f32,
}

/// Periodic device summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// enable state of each channel, channel 1 first
    pub channels: [bool; CHANNELS],

    /// sum over enabled channels with a reading
    pub voltage: f32,

    /// sum over enabled channels with a reading
    pub current: f32,

    pub uptime_ms: u64,

    /// open websocket clients
    pub clients: usize,
}

/// Outgoing message, borrowed from the producer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound<'a> {
    Log {
        level: Level,
        source: &'a str,
        message: &'a str,
    },
    ChannelData {
        channel: u8,
        voltage: f32,
        current: f32,
    },
    Status(&'a StatusSnapshot),
}

impl<'a> Outbound<'a> {
    /// Serialize into `buf`, returning the number of bytes written.
    ///
    /// Running out of room is reported as a serde_json io error, which
    /// converts to [`CapacityError::PayloadTooLarge`](crate::error::CapacityError).
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, serde_json::Error> {
        let cap = buf.len();
        let mut w = &mut buf[..];
        serde_json::to_writer(&mut w, self)?;
        Ok(cap - w.len())
    }
}
