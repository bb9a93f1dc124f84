//! The server context.
//!
//! [`Server`] owns the listener, the client table, the outbound queue and
//! the registered callbacks. The host drives it by calling
//! [`Server::update`] once per tick (every 100ms or faster); one call
//! never blocks.
//!
//! ```no_run
//! use wsdash::{Config, Server, MonotonicClock};
//!
//! let config = Config::default().port(8080);
//! let mut server = Server::bind(config, (), MonotonicClock::new()).unwrap();
//!
//! loop {
//!     server.update();
//!     std::thread::sleep(std::time::Duration::from_millis(50));
//! }
//! ```

mod accept;
mod read;
mod write;

use std::fmt::{self, Write as _};
use std::io;
use std::net::SocketAddr;

use log::{debug, info};

use crate::clock::Clock;
use crate::config::{Config, MAX_CLIENTS, QUEUE_CAPACITY};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::frame::OpCode;
use crate::handler::{ClientListener, CommandHandler};
use crate::message::{ClientId, Level, Outbound, Reading, StatusSnapshot, Target};
use crate::publisher::{self, Diagnostics, StatusPublisher};
use crate::queue::MessageQueue;
use crate::table::ClientTable;
use crate::transport::{Connection, Listener};

/// `source` of log messages the server writes itself.
const LOG_SOURCE: &str = "ws";

/// Close status sent when the server shuts down.
const CLOSE_GOING_AWAY: u16 = 1001;

/// WebSocket server for a small, fixed number of clients.
pub struct Server<L: Listener, D, K, const N: usize = MAX_CLIENTS> {
    /// dropped on stop
    listener: Option<L>,
    diag: D,
    clock: K,
    config: Config,
    table: ClientTable<L::Conn, N>,
    queue: MessageQueue<QUEUE_CAPACITY>,
    publisher: StatusPublisher,
    dispatcher: Dispatcher,
    clients: Option<Box<dyn ClientListener>>,
    started_ms: u64,
    rejected: u64,
    running: bool,
}

cfg_if::cfg_if! {
    if #[cfg(feature = "tcp")] {
        use std::net::TcpListener;

        impl<D, K> Server<TcpListener, D, K>
        where
            D: Diagnostics,
            K: Clock,
        {
            /// Listen on `config.port` on every interface.
            pub fn bind(config: Config, diag: D, clock: K) -> Result<Self> {
                config.validate()?;
                let listener = crate::transport::bind(config.port)?;
                Self::with_listener(listener, config, diag, clock)
            }
        }
    }
}

impl<L, D, K, const N: usize> Server<L, D, K, N>
where
    L: Listener,
    D: Diagnostics,
    K: Clock,
{
    /// Serve connections accepted from `listener`, which must be
    /// non-blocking.
    pub fn with_listener(listener: L, config: Config, diag: D, clock: K) -> Result<Self> {
        config.validate()?;

        let now = clock.now_ms();
        match listener.local_addr() {
            Ok(addr) => info!("websocket server listening on {}", addr),
            Err(e) => debug!("websocket server started, address unknown: {}", e),
        }

        Ok(Self {
            listener: Some(listener),
            diag,
            clock,
            publisher: StatusPublisher::new(config.status_interval_ms, now),
            config,
            table: ClientTable::new(),
            queue: MessageQueue::new(),
            dispatcher: Dispatcher::new(),
            clients: None,
            started_ms: now,
            rejected: 0,
            running: true,
        })
    }

    /// Replace the handler for commands the server does not answer itself.
    pub fn register_command_handler<H>(&mut self, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.dispatcher.register(Box::new(handler));
    }

    /// Replace the connect/disconnect observer.
    pub fn register_client_listener<H>(&mut self, listener: H)
    where
        H: ClientListener + 'static,
    {
        self.clients = Some(Box::new(listener));
    }

    #[inline]
    pub fn config(&self) -> &Config { &self.config }

    /// Fails with `NotConnected` once the server is stopped.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self.listener.as_ref() {
            Some(l) => l.local_addr(),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    #[inline]
    pub const fn is_running(&self) -> bool { self.running }

    /// Clients that completed the handshake.
    #[inline]
    pub fn client_count(&self) -> usize { self.table.open_count() }

    /// Messages refused because the queue was full.
    #[inline]
    pub const fn dropped_messages(&self) -> u64 { self.queue.dropped() }

    /// Connections turned away because every slot was taken.
    #[inline]
    pub const fn rejected_connections(&self) -> u64 { self.rejected }

    /// Queue a raw text payload.
    pub fn enqueue(&mut self, payload: &[u8], target: Target) -> Result<()> {
        self.queue.enqueue(payload, target)
    }

    /// Broadcast a log line.
    pub fn enqueue_log(&mut self, level: Level, source: &str, message: &str) -> Result<()> {
        self.enqueue_outbound(
            &Outbound::Log {
                level,
                source,
                message,
            },
            Target::All,
        )
    }

    /// Broadcast a reading of one channel.
    pub fn enqueue_channel_data(&mut self, channel: u8, reading: Reading) -> Result<()> {
        self.enqueue_outbound(
            &Outbound::ChannelData {
                channel,
                voltage: reading.voltage,
                current: reading.current,
            },
            Target::All,
        )
    }

    /// Broadcast a status snapshot.
    pub fn enqueue_status(&mut self, snapshot: &StatusSnapshot) -> Result<()> {
        self.enqueue_outbound(&Outbound::Status(snapshot), Target::All)
    }

    /// Run one tick: accept, read, dispatch, expire, publish, send, release.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }
        let now = self.clock.now_ms();

        self.accept_pending(now);
        self.poll_clients(now);
        self.expire_idle(now);

        if self.publisher.poll(now) {
            let snapshot = self.snapshot();
            if let Err(e) = self.enqueue_status(&snapshot) {
                debug!("status snapshot dropped: {}", e);
            }
        }

        self.drain();
        self.release_closed();
    }

    /// Close every client and the listener. Disconnect callbacks fire
    /// before this returns.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        info!("websocket server stopping");
        self.listener = None;

        let code = CLOSE_GOING_AWAY.to_be_bytes();
        for slot in self.table.iter_mut().filter(|s| !s.is_free()) {
            if slot.is_open() {
                let _ = slot.send_frame(OpCode::Close, &code);
            }
            slot.close();
        }

        self.release_closed();
        self.queue.clear();
    }

    /// Status as of now, built from the diagnostics source.
    pub fn snapshot(&self) -> StatusSnapshot {
        let uptime = self.clock.now_ms().saturating_sub(self.started_ms);
        publisher::snapshot(&self.diag, uptime, self.table.open_count())
    }

    fn enqueue_outbound(&mut self, msg: &Outbound, target: Target) -> Result<()> {
        self.queue
            .enqueue_with(target, |buf| msg.encode(buf).map_err(Into::into))
    }

    /// Queue a log line for one client, formatted without allocating.
    fn reply_log(&mut self, client: ClientId, level: Level, args: fmt::Arguments) {
        let mut buf = StackStr::<128>::new();
        let _ = buf.write_fmt(args);

        let msg = Outbound::Log {
            level,
            source: LOG_SOURCE,
            message: buf.as_str(),
        };
        if let Err(e) = self.enqueue_outbound(&msg, Target::Client(client)) {
            debug!("client {}: reply dropped: {}", client, e);
        }
    }

    fn expire_idle(&mut self, now: u64) {
        let timeout = match self.config.idle_timeout_ms {
            Some(t) => t,
            None => return,
        };

        for slot in self.table.iter_mut().filter(|s| !s.is_free()) {
            if now.saturating_sub(slot.last_activity()) >= timeout {
                info!("client {}: idle for {}ms, closing", slot.id(), timeout);
                slot.close();
            }
        }
    }

    /// Free every slot marked for closing.
    fn release_closed(&mut self) {
        for (id, mut conn, addr, announced) in self.table.reap() {
            conn.close();
            info!("client {}: disconnected ({})", id, addr);

            if announced {
                if let Some(l) = self.clients.as_mut() {
                    l.on_disconnect(id, addr);
                }
            }
        }
    }
}

/// Fixed-size text buffer that silently truncates on a char boundary.
struct StackStr<const M: usize> {
    buf: [u8; M],
    len: usize,
}

impl<const M: usize> StackStr<M> {
    const fn new() -> Self { Self { buf: [0; M], len: 0 } }

    fn as_str(&self) -> &str {
        // only whole chars are ever copied in
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }
}

impl<const M: usize> fmt::Write for StackStr<M> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = M - self.len;
        let mut n = std::cmp::min(room, s.len());
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;

        if n < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}
