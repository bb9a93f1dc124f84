use std::io::Write;

use log::{debug, info, warn};

use super::Server;

use crate::clock::Clock;
use crate::error::{Error, HandshakeError};
use crate::handshake::{derive_accept_key, Reject, Request, Response};
use crate::publisher::Diagnostics;
use crate::table::Slot;
use crate::transport::{Connection, Listener};

/// Large enough for any response the server writes during a handshake.
const RESPONSE_BUF_LEN: usize = 256;

/// Where a pending handshake stands after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Handshake {
    /// The request is still incomplete.
    Pending,

    /// 101 sent, the slot is open.
    Opened,

    /// Refused, the slot is closing.
    Failed,
}

impl<L, D, K, const N: usize> Server<L, D, K, N>
where
    L: Listener,
    D: Diagnostics,
    K: Clock,
{
    /// Take every pending connection off the listener.
    pub(super) fn accept_pending(&mut self, now: u64) {
        let listener = match self.listener.as_mut() {
            Some(l) => l,
            None => return,
        };

        loop {
            let (conn, addr) = match listener.accept() {
                Ok(Some(x)) => x,
                Ok(None) => return,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    return;
                }
            };

            match self.table.insert(conn, addr, now) {
                Ok(id) => info!("client {}: accepted from {}", id, addr),
                Err((mut conn, e)) => {
                    self.rejected += 1;
                    warn!("rejecting {}: {}", addr, e);
                    send_reject(&mut conn, Reject::Busy);
                    conn.close();
                }
            }
        }
    }
}

/// Try to complete the upgrade with what the slot has buffered.
///
/// Bytes following the request stay in the scratch buffer; they are the
/// first frames of the session. `seq` is the queue position the client
/// starts receiving from.
pub(super) fn advance_handshake<C: Connection>(slot: &mut Slot<C>, seq: u64) -> Handshake {
    let parsed = {
        let mut request = Request::new();
        request.decode(slot.scratch.read()).map(|n| {
            debug!(
                "client {}: upgrade request for {} on {}",
                slot.id(),
                String::from_utf8_lossy(request.path),
                String::from_utf8_lossy(request.host)
            );
            (n, derive_accept_key(request.sec_key))
        })
    };

    let (parsed_n, sec_accept) = match parsed {
        Ok(x) => x,
        Err(HandshakeError::NotEnoughData) if !slot.scratch.is_full() => return Handshake::Pending,
        Err(HandshakeError::NotEnoughData) => {
            return fail(slot, HandshakeError::NotEnoughCapacity);
        }
        Err(e) => return fail(slot, e),
    };

    if let Err(e) = send_response(slot, &sec_accept) {
        warn!("client {}: handshake response failed: {}", slot.id(), e);
        slot.close();
        return Handshake::Failed;
    }

    slot.scratch.consume(parsed_n);
    slot.open(seq);
    Handshake::Opened
}

fn send_response<C: Connection>(slot: &mut Slot<C>, sec_accept: &[u8]) -> Result<(), Error> {
    let mut buf = [0_u8; RESPONSE_BUF_LEN];
    let n = Response { sec_accept }.encode(&mut buf)?;
    slot.send_raw(&buf[..n])?;
    Ok(())
}

fn fail<C: Connection>(slot: &mut Slot<C>, e: HandshakeError) -> Handshake {
    let reject = Reject::from_error(&e);
    warn!("client {}: handshake failed: {}", slot.id(), e);

    let mut buf = [0_u8; RESPONSE_BUF_LEN];
    if let Ok(n) = reject.encode(&mut buf) {
        let _ = slot.send_raw(&buf[..n]);
    }
    slot.close();
    Handshake::Failed
}

/// Best effort, the connection is dropped right after.
fn send_reject<C: Connection>(conn: &mut C, reject: Reject) {
    let mut buf = [0_u8; RESPONSE_BUF_LEN];
    if let Ok(n) = reject.encode(&mut buf) {
        let _ = conn.write_all(&buf[..n]).and_then(|_| conn.flush());
    }
}
