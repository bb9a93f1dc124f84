//! Outbound message queue.
//!
//! A fixed ring of fixed-size messages. When the ring is full the new
//! message is refused and counted; queued messages are never evicted.
//!
//! Every accepted message takes the next sequence number. A client only
//! receives messages numbered at or after the point it opened.

use crate::config::MAX_MESSAGE_LEN;
use crate::error::{CapacityError, Error};
use crate::message::Target;

/// A queued message.
#[derive(Clone, Copy)]
pub struct Message {
    seq: u64,
    target: Target,
    len: usize,
    payload: [u8; MAX_MESSAGE_LEN],
}

impl Message {
    const EMPTY: Message = Message {
        seq: 0,
        target: Target::All,
        len: 0,
        payload: [0; MAX_MESSAGE_LEN],
    };

    /// Position in the order messages were queued.
    #[inline]
    pub const fn seq(&self) -> u64 { self.seq }

    #[inline]
    pub const fn target(&self) -> Target { self.target }

    #[inline]
    pub fn payload(&self) -> &[u8] { &self.payload[..self.len] }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("seq", &self.seq)
            .field("target", &self.target)
            .field("payload", &String::from_utf8_lossy(self.payload()))
            .finish()
    }
}

/// Bounded FIFO of outbound messages.
pub struct MessageQueue<const Q: usize> {
    ring: [Message; Q],
    head: usize,
    len: usize,
    next_seq: u64,
    dropped: u64,
}

impl<const Q: usize> Default for MessageQueue<Q> {
    fn default() -> Self { Self::new() }
}

impl<const Q: usize> MessageQueue<Q> {
    pub const fn new() -> Self {
        Self {
            ring: [Message::EMPTY; Q],
            head: 0,
            len: 0,
            next_seq: 0,
            dropped: 0,
        }
    }

    #[inline]
    pub const fn len(&self) -> usize { self.len }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.len == 0 }

    #[inline]
    pub const fn is_full(&self) -> bool { self.len == Q }

    #[inline]
    pub const fn capacity(&self) -> usize { Q }

    /// Sequence number the next queued message will get.
    #[inline]
    pub const fn next_seq(&self) -> u64 { self.next_seq }

    /// Messages refused because the queue was full.
    #[inline]
    pub const fn dropped(&self) -> u64 { self.dropped }

    /// Queue a copy of `payload`.
    pub fn enqueue(&mut self, payload: &[u8], target: Target) -> Result<(), Error> {
        self.enqueue_with(target, |buf| {
            let dst = buf
                .get_mut(..payload.len())
                .ok_or(CapacityError::PayloadTooLarge)?;
            dst.copy_from_slice(payload);
            Ok(payload.len())
        })
    }

    /// Queue a message written in place by `f`, which receives the
    /// whole payload buffer and returns the number of bytes it used.
    ///
    /// If `f` fails nothing is queued.
    pub fn enqueue_with<F>(&mut self, target: Target, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut [u8]) -> Result<usize, Error>,
    {
        if self.is_full() {
            self.dropped += 1;
            return Err(CapacityError::QueueFull.into());
        }

        let idx = (self.head + self.len) % Q;
        let slot = &mut self.ring[idx];
        let len = f(&mut slot.payload)?;

        slot.len = std::cmp::min(len, MAX_MESSAGE_LEN);
        slot.target = target;
        slot.seq = self.next_seq;
        self.next_seq += 1;
        self.len += 1;
        Ok(())
    }

    /// Take the oldest message.
    pub fn pop(&mut self) -> Option<Message> {
        if self.is_empty() {
            return None;
        }
        let msg = self.ring[self.head];
        self.head = (self.head + 1) % Q;
        self.len -= 1;
        Some(msg)
    }

    /// Drop everything queued. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
