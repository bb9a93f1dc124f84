use log::{debug, info, trace, warn};

use super::accept::{advance_handshake, Handshake};
use super::Server;

use crate::clock::Clock;
use crate::config::SCRATCH_SIZE;
use crate::dispatch::{Builtin, Outcome};
use crate::error::FrameError;
use crate::frame::{self, Decoded, OpCode};
use crate::message::{ClientId, Level, Outbound, Target};
use crate::publisher::{self, Diagnostics};
use crate::table::{Recv, SlotState};
use crate::transport::Listener;

/// Close status for a malformed frame.
const CLOSE_PROTOCOL_ERROR: u16 = 1002;

/// Close status for a frame that does not fit in the scratch buffer.
const CLOSE_TOO_BIG: u16 = 1009;

/// What to do with the frame just taken off the scratch buffer. Payloads
/// are copied out first, so the slot is free to be borrowed again.
enum Step {
    Text(usize),
    Ping(usize),
    Close(usize),
    Ignore(OpCode),
    TooBig,
    Error(FrameError),
}

impl<L, D, K, const N: usize> Server<L, D, K, N>
where
    L: Listener,
    D: Diagnostics,
    K: Clock,
{
    /// Read from every occupied slot and act on what arrived.
    pub(super) fn poll_clients(&mut self, now: u64) {
        for i in 0..N {
            let id = ClientId(i);
            let slot = match self.table.get_mut(id) {
                Some(s) => s,
                None => continue,
            };

            match slot.state() {
                SlotState::HandshakePending | SlotState::Open => {}
                SlotState::Free | SlotState::Closing => continue,
            }

            match slot.recv(now) {
                Ok(Recv::Data(n)) => trace!("client {}: read {} bytes", id, n),
                Ok(Recv::NotReady) => {}
                Ok(Recv::Eof) => {
                    info!("client {}: connection closed by peer", id);
                    slot.close();
                    continue;
                }
                Err(e) => {
                    warn!("client {}: read failed: {}", id, e);
                    slot.close();
                    continue;
                }
            }

            if slot.state() == SlotState::HandshakePending {
                match advance_handshake(slot, self.queue.next_seq()) {
                    Handshake::Opened => {
                        let addr = slot.addr();
                        info!("client {}: websocket open", id);
                        if let (Some(l), Some(addr)) = (self.clients.as_mut(), addr) {
                            l.on_connect(id, addr);
                        }
                    }
                    Handshake::Pending | Handshake::Failed => continue,
                }
            }

            self.process_frames(id);
        }
    }

    /// Handle every complete frame buffered for an open slot.
    fn process_frames(&mut self, id: ClientId) {
        let mut payload = [0_u8; SCRATCH_SIZE];

        loop {
            let slot = match self.table.get_mut(id) {
                Some(s) if s.is_open() => s,
                _ => return,
            };
            if slot.scratch.is_empty() {
                return;
            }

            let step = match frame::decode(slot.scratch.read_mut(), SCRATCH_SIZE) {
                Ok(Decoded::Incomplete) => return,
                Ok(Decoded::Complete { frame, consumed }) => {
                    let n = frame.payload.len();
                    payload[..n].copy_from_slice(frame.payload);

                    let step = match frame.opcode {
                        OpCode::Text => Step::Text(n),
                        OpCode::Ping => Step::Ping(n),
                        OpCode::Close => Step::Close(n),
                        op => Step::Ignore(op),
                    };
                    slot.scratch.consume(consumed);
                    step
                }
                Err(FrameError::ExceedsLimit) => Step::TooBig,
                Err(e) => Step::Error(e),
            };

            match step {
                Step::Text(n) => {
                    debug!("client {}: text frame, {} bytes", id, n);
                    self.handle_command(&payload[..n], id);
                }
                Step::Ping(n) => {
                    trace!("client {}: ping", id);
                    if let Err(e) = slot.send_frame(OpCode::Pong, &payload[..n]) {
                        warn!("client {}: pong failed: {}", id, e);
                        slot.close();
                    }
                }
                Step::Close(n) => {
                    debug!("client {}: close frame", id);
                    let _ = slot.send_frame(OpCode::Close, &payload[..n]);
                    slot.close();
                }
                Step::Ignore(op) => trace!("client {}: ignoring {:?} frame", id, op),
                Step::TooBig => {
                    warn!("client {}: frame exceeds {} bytes", id, SCRATCH_SIZE);
                    let _ = slot.send_frame(OpCode::Close, &CLOSE_TOO_BIG.to_be_bytes());
                    slot.close();
                }
                Step::Error(e) => {
                    warn!("client {}: protocol error: {}", id, e);
                    let _ = slot.send_frame(OpCode::Close, &CLOSE_PROTOCOL_ERROR.to_be_bytes());
                    slot.close();
                }
            }
        }
    }

    /// Run one text payload through the dispatcher and queue the reply,
    /// if there is one.
    fn handle_command(&mut self, payload: &[u8], id: ClientId) {
        match self.dispatcher.dispatch(payload, id) {
            Ok(Outcome::Handled) => {}
            Ok(Outcome::Builtin(Builtin::Status)) => {
                let snapshot = self.snapshot();
                self.reply(id, &Outbound::Status(&snapshot));
            }
            Ok(Outcome::Builtin(Builtin::Channels)) => {
                for channel in publisher::channels() {
                    if let Some(r) = self.diag.read_channel(channel) {
                        let msg = Outbound::ChannelData {
                            channel,
                            voltage: r.voltage,
                            current: r.current,
                        };
                        self.reply(id, &msg);
                    }
                }
            }
            Ok(Outcome::Unhandled(name)) => {
                debug!("client {}: unhandled command {:?}", id, name);
                self.reply_log(id, Level::Warn, format_args!("unknown command: {}", name));
            }
            Err(e) => {
                debug!("client {}: malformed command: {}", id, e);
                self.reply_log(id, Level::Error, format_args!("{}", e));
            }
        }
    }

    fn reply(&mut self, id: ClientId, msg: &Outbound) {
        if let Err(e) = self.enqueue_outbound(msg, Target::Client(id)) {
            debug!("client {}: reply dropped: {}", id, e);
        }
    }
}
