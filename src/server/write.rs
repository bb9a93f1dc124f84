use log::{trace, warn};

use super::Server;

use crate::clock::Clock;
use crate::frame::{self, OpCode};
use crate::message::Target;
use crate::publisher::Diagnostics;
use crate::table::FRAME_BUF_LEN;
use crate::transport::Listener;

impl<L, D, K, const N: usize> Server<L, D, K, N>
where
    L: Listener,
    D: Diagnostics,
    K: Clock,
{
    /// Send every queued message to its open recipients.
    ///
    /// A client that opened after a message was queued does not get it,
    /// and a unicast does not follow its slot to a new connection. Each
    /// message is framed once. A failed send only closes the slot it was
    /// meant for.
    pub(super) fn drain(&mut self) {
        let mut buf = [0_u8; FRAME_BUF_LEN];

        while let Some(msg) = self.queue.pop() {
            let n = match frame::encode(msg.payload(), OpCode::Text, &mut buf) {
                Ok(n) => n,
                Err(e) => {
                    warn!("dropping queued message: {}", e);
                    continue;
                }
            };

            let seq = msg.seq();
            let recipients = self.table.iter_mut().filter(|s| s.receives(seq)).filter(|s| {
                match msg.target() {
                    Target::All => true,
                    Target::Client(id) => s.id() == id,
                }
            });

            let mut sent = 0;
            for slot in recipients {
                match slot.send_raw(&buf[..n]) {
                    Ok(()) => sent += 1,
                    Err(e) => {
                        warn!("client {}: send failed: {}", slot.id(), e);
                        slot.close();
                    }
                }
            }
            trace!("sent {} byte message to {} clients", msg.payload().len(), sent);
        }
    }
}
