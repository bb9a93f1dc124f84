//! Periodic status publisher.

use crate::config::CHANNELS;
use crate::message::{Reading, StatusSnapshot};

/// Source of device readings.
///
/// Channels are numbered from 1.
pub trait Diagnostics {
    /// Enable state of every channel, channel 1 first.
    fn channel_states(&self) -> [bool; CHANNELS];

    /// Latest reading of `channel`, or `None` if it has none.
    fn read_channel(&self, channel: u8) -> Option<Reading>;
}

/// A device without channels.
impl Diagnostics for () {
    fn channel_states(&self) -> [bool; CHANNELS] { [false; CHANNELS] }

    fn read_channel(&self, _: u8) -> Option<Reading> { None }
}

impl<D: Diagnostics> Diagnostics for &D {
    #[inline]
    fn channel_states(&self) -> [bool; CHANNELS] { (**self).channel_states() }

    #[inline]
    fn read_channel(&self, channel: u8) -> Option<Reading> { (**self).read_channel(channel) }
}

/// Channel numbers in order.
pub fn channels() -> impl Iterator<Item = u8> { (1..=CHANNELS).map(|c| c as u8) }

/// Build a snapshot, summing the readings of enabled channels.
pub fn snapshot<D: Diagnostics>(diag: &D, uptime_ms: u64, clients: usize) -> StatusSnapshot {
    let states = diag.channel_states();
    let (voltage, current) = channels()
        .zip(states)
        .filter(|(_, on)| *on)
        .filter_map(|(ch, _)| diag.read_channel(ch))
        .fold((0.0, 0.0), |(v, c), r| (v + r.voltage, c + r.current));

    StatusSnapshot {
        channels: states,
        voltage,
        current,
        uptime_ms,
        clients,
    }
}

/// Fires once per interval.
#[derive(Debug, Clone, Copy)]
pub struct StatusPublisher {
    interval_ms: u64,
    last_fired: u64,
}

impl StatusPublisher {
    /// An interval of 0 never fires.
    pub const fn new(interval_ms: u64, now: u64) -> Self {
        Self {
            interval_ms,
            last_fired: now,
        }
    }

    #[inline]
    pub const fn interval_ms(&self) -> u64 { self.interval_ms }

    #[inline]
    pub const fn is_enabled(&self) -> bool { self.interval_ms != 0 }

    /// Return true at most once per interval.
    pub fn poll(&mut self, now: u64) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if now.saturating_sub(self.last_fired) >= self.interval_ms {
            self.last_fired = now;
            true
        } else {
            false
        }
    }
}
