//! Millisecond clock.

use std::time::Instant;

/// A monotonic millisecond counter.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self { Self { start: Instant::now() } }
}

impl Default for MonotonicClock {
    fn default() -> Self { Self::new() }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> u64 { self.start.elapsed().as_millis() as u64 }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_ms(&self) -> u64 { (**self).now_ms() }
}
