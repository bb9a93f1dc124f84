//! Server configuration.
//!
//! Runtime knobs live in [`Config`]. Buffer and table sizes are
//! compile-time constants, since every buffer is a fixed array.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Client table capacity.
pub const MAX_CLIENTS: usize = 4;

/// Per-slot receive buffer. Bounds both the upgrade request and any
/// single incoming frame.
pub const SCRATCH_SIZE: usize = 1024;

/// Largest outgoing message payload.
pub const MAX_MESSAGE_LEN: usize = 512;

/// Outbound queue capacity.
pub const QUEUE_CAPACITY: usize = 16;

/// Number of diagnostic channels reported in status snapshots.
pub const CHANNELS: usize = 4;

pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tcp port to listen on. 0 picks an ephemeral port.
    pub port: u16,

    /// Period of the status broadcast, 0 disables it.
    pub status_interval_ms: u64,

    /// Close connections that have been silent this long.
    pub idle_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            idle_timeout_ms: None,
        }
    }
}

impl Config {
    #[inline]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[inline]
    pub fn status_interval_ms(mut self, ms: u64) -> Self {
        self.status_interval_ms = ms;
        self
    }

    #[inline]
    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = Some(ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == Some(0) {
            return Err(Error::Config("idle_timeout_ms must be greater than 0"));
        }
        Ok(())
    }
}
