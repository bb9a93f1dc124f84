//! Client table.
//!
//! A fixed array of connection slots. A slot walks
//! `Free -> HandshakePending -> Open -> Closing -> Free`; a failed
//! handshake may skip `Open`, nothing ever skips `HandshakePending`.
//! A slot holds a connection exactly when it is not `Free`.

use std::io::{self, ErrorKind, Read, Write};
use std::net::SocketAddr;

use log::debug;

use crate::buf::Store;
use crate::config::{SCRATCH_SIZE, MAX_MESSAGE_LEN};
use crate::error::{CapacityError, Error};
use crate::frame::{self, OpCode, MAX_SERVER_HEAD_LEN};
use crate::message::ClientId;
use crate::transport::Connection;

/// Room for one encoded outgoing frame.
pub(crate) const FRAME_BUF_LEN: usize = MAX_SERVER_HEAD_LEN + MAX_MESSAGE_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    HandshakePending,
    Open,
    Closing,
}

/// Result of one non-blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recv {
    /// bytes appended to the scratch buffer
    Data(usize),

    /// nothing to read, or no room to read into
    NotReady,

    /// the peer closed its side
    Eof,
}

/// One connection slot.
#[derive(Debug)]
pub struct Slot<C> {
    id: ClientId,
    state: SlotState,
    conn: Option<C>,
    addr: Option<SocketAddr>,
    last_activity: u64,
    /// whether the connect notification went out
    announced: bool,
    /// first queue sequence number this client may receive
    opened_seq: u64,
    pub(crate) scratch: Store<SCRATCH_SIZE>,
}

impl<C> Slot<C> {
    fn new(id: ClientId) -> Self {
        Self {
            id,
            state: SlotState::Free,
            conn: None,
            addr: None,
            last_activity: 0,
            announced: false,
            opened_seq: 0,
            scratch: Store::new(),
        }
    }

    #[inline]
    pub const fn id(&self) -> ClientId { self.id }

    #[inline]
    pub const fn state(&self) -> SlotState { self.state }

    #[inline]
    pub const fn addr(&self) -> Option<SocketAddr> { self.addr }

    #[inline]
    pub const fn last_activity(&self) -> u64 { self.last_activity }

    #[inline]
    pub const fn is_free(&self) -> bool { matches!(self.state, SlotState::Free) }

    #[inline]
    pub const fn is_open(&self) -> bool { matches!(self.state, SlotState::Open) }

    #[inline]
    pub(crate) const fn announced(&self) -> bool { self.announced }

    /// Whether a message queued with sequence number `seq` is for this
    /// client. Anything queued before the slot opened is not.
    #[inline]
    pub(crate) const fn receives(&self, seq: u64) -> bool { self.is_open() && seq >= self.opened_seq }

    /// HandshakePending -> Open. `seq` is the queue's next sequence
    /// number at this moment.
    pub(crate) fn open(&mut self, seq: u64) {
        debug_assert_eq!(self.state, SlotState::HandshakePending);
        self.state = SlotState::Open;
        self.announced = true;
        self.opened_seq = seq;
    }

    /// Mark for release at the end of the current phase.
    pub(crate) fn close(&mut self) {
        if !self.is_free() {
            self.state = SlotState::Closing;
        }
    }

    fn occupy(&mut self, conn: C, addr: SocketAddr, now: u64) {
        debug_assert!(self.is_free());
        self.conn = Some(conn);
        self.addr = Some(addr);
        self.state = SlotState::HandshakePending;
        self.last_activity = now;
        self.announced = false;
        self.scratch.reset();
    }

    /// Return the slot to `Free`, handing back what it held.
    fn release(&mut self) -> Option<(C, SocketAddr, bool)> {
        let conn = self.conn.take()?;
        let addr = self.addr.take()?;
        let announced = self.announced;

        self.state = SlotState::Free;
        self.last_activity = 0;
        self.announced = false;
        self.opened_seq = 0;
        self.scratch.reset();

        Some((conn, addr, announced))
    }
}

impl<C: Connection> Slot<C> {
    /// Read what the socket has into the scratch buffer. Only incoming
    /// bytes count as activity.
    pub(crate) fn recv(&mut self, now: u64) -> io::Result<Recv> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| io::Error::from(ErrorKind::NotConnected))?;

        let buf = self.scratch.write();
        if buf.is_empty() {
            return Ok(Recv::NotReady);
        }

        match conn.read(buf) {
            Ok(0) => Ok(Recv::Eof),
            Ok(n) => {
                self.scratch.advance_wr_pos(n);
                self.last_activity = now;
                Ok(Recv::Data(n))
            }
            Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(Recv::NotReady)
            }
            Err(e) => Err(e),
        }
    }

    /// Write all of `buf`. A socket that cannot take it right now is
    /// treated like a broken one.
    pub(crate) fn send_raw(&mut self, buf: &[u8]) -> io::Result<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| io::Error::from(ErrorKind::NotConnected))?;
        conn.write_all(buf)?;
        conn.flush()
    }

    /// Encode and send one frame.
    pub(crate) fn send_frame(&mut self, opcode: OpCode, payload: &[u8]) -> Result<(), Error> {
        let mut buf = [0_u8; FRAME_BUF_LEN];
        let n = frame::encode(payload, opcode, &mut buf)?;
        self.send_raw(&buf[..n])?;
        Ok(())
    }
}

/// Fixed-capacity table of connection slots.
#[derive(Debug)]
pub struct ClientTable<C, const N: usize> {
    slots: [Slot<C>; N],
}

impl<C, const N: usize> Default for ClientTable<C, N> {
    fn default() -> Self { Self::new() }
}

impl<C, const N: usize> ClientTable<C, N> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|i| Slot::new(ClientId(i))),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize { N }

    /// Clients that finished the handshake.
    pub fn open_count(&self) -> usize { self.slots.iter().filter(|s| s.is_open()).count() }

    #[inline]
    pub fn get(&self, id: ClientId) -> Option<&Slot<C>> { self.slots.get(id.0) }

    #[inline]
    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Slot<C>> { self.slots.get_mut(id.0) }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Slot<C>> { self.slots.iter() }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Slot<C>> { self.slots.iter_mut() }

    /// Place a new connection in the first free slot.
    ///
    /// On a full table the connection is handed back untouched.
    pub fn insert(&mut self, conn: C, addr: SocketAddr, now: u64) -> Result<ClientId, (C, CapacityError)> {
        match self.slots.iter_mut().find(|s| s.is_free()) {
            Some(slot) => {
                slot.occupy(conn, addr, now);
                debug!("slot {}: occupied by {}", slot.id, addr);
                Ok(slot.id)
            }
            None => Err((conn, CapacityError::TableFull)),
        }
    }

    /// Release every `Closing` slot, returning the slot id, connection,
    /// address, and whether it had been announced as connected.
    pub fn reap(&mut self) -> impl Iterator<Item = (ClientId, C, SocketAddr, bool)> + '_ {
        self.slots
            .iter_mut()
            .filter(|s| s.state == SlotState::Closing)
            .filter_map(|s| {
                let id = s.id;
                s.release().map(|(conn, addr, announced)| (id, conn, addr, announced))
            })
    }
}
