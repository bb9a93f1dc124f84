#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::rc::Rc;

use wsdash::config::CHANNELS;
use wsdash::{ClientId, ClientListener, Clock, CommandHandler, Config, Diagnostics, Reading, Server};
use wsdash::{Connection, Listener};

pub const HOST: &str = "192.168.4.1";
pub const PATH: &str = "/ws";
pub const SEC_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";
pub const SEC_ACCEPT: &str = "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=";

pub const OP_TEXT: u8 = 0x1;
pub const OP_BINARY: u8 = 0x2;
pub const OP_CLOSE: u8 = 0x8;
pub const OP_PING: u8 = 0x9;
pub const OP_PONG: u8 = 0xa;

pub type TestServer = Server<MockListener, Bench, ManualClock>;

pub fn upgrade_request() -> String {
    format!(
        "GET {} HTTP/1.1\r\n\
         Host: {}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n",
        PATH, HOST, SEC_KEY
    )
}

/// A masked client frame with a random key.
pub fn client_frame(opcode: u8, payload: &[u8]) -> Vec<u8> {
    let key: [u8; 4] = rand::random();
    let mut out = vec![0x80 | opcode];

    if payload.len() < 126 {
        out.push(0x80 | payload.len() as u8);
    } else {
        out.push(0x80 | 126);
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    }

    out.extend_from_slice(&key);
    out.extend(payload.iter().enumerate().map(|(i, b)| b ^ key[i % 4]));
    out
}

/// Both directions of one in-memory connection.
#[derive(Default)]
pub struct Pipe {
    to_server: VecDeque<u8>,
    to_client: Vec<u8>,
    peer_closed: bool,
    server_closed: bool,
    fail_writes: bool,
}

/// Server side of a [`Pipe`].
pub struct MockConn(Rc<RefCell<Pipe>>);

impl Read for MockConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pipe = self.0.borrow_mut();
        if pipe.to_server.is_empty() {
            return if pipe.peer_closed {
                Ok(0)
            } else {
                Err(ErrorKind::WouldBlock.into())
            };
        }

        let n = buf.len().min(pipe.to_server.len());
        for (dst, src) in buf.iter_mut().zip(pipe.to_server.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for MockConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut pipe = self.0.borrow_mut();
        if pipe.fail_writes || pipe.peer_closed {
            return Err(ErrorKind::BrokenPipe.into());
        }
        pipe.to_client.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl Connection for MockConn {
    fn close(&mut self) { self.0.borrow_mut().server_closed = true; }
}

/// Client side of a [`Pipe`].
pub struct Peer {
    pipe: Rc<RefCell<Pipe>>,
    pub addr: SocketAddr,
    rx: Vec<u8>,
}

impl Peer {
    pub fn send(&self, bytes: &[u8]) { self.pipe.borrow_mut().to_server.extend(bytes.iter().copied()); }

    pub fn send_frame(&self, opcode: u8, payload: &[u8]) { self.send(&client_frame(opcode, payload)); }

    pub fn send_text(&self, text: &str) { self.send_frame(OP_TEXT, text.as_bytes()); }

    pub fn send_upgrade(&self) { self.send(upgrade_request().as_bytes()); }

    /// Hang up; the server reads eof once the pipe is drained.
    pub fn hang_up(&self) { self.pipe.borrow_mut().peer_closed = true; }

    pub fn fail_writes(&self) { self.pipe.borrow_mut().fail_writes = true; }

    /// Whether the server closed its end.
    pub fn is_closed(&self) -> bool { self.pipe.borrow().server_closed }

    fn pull(&mut self) {
        let mut pipe = self.pipe.borrow_mut();
        self.rx.append(&mut pipe.to_client);
    }

    /// The http response, if a complete one arrived.
    pub fn response(&mut self) -> Option<String> {
        self.pull();
        let end = self.rx.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
        let text = String::from_utf8(self.rx.drain(..end).collect()).unwrap();
        Some(text)
    }

    /// Every complete frame received so far, as opcode and payload.
    pub fn frames(&mut self) -> Vec<(u8, Vec<u8>)> {
        self.pull();
        let mut frames = Vec::new();

        loop {
            if self.rx.len() < 2 {
                break;
            }
            assert_eq!(self.rx[0] & 0xf0, 0x80, "server frames are final");
            assert_eq!(self.rx[1] & 0x80, 0, "server frames are never masked");

            let (len, head) = match self.rx[1] & 0x7f {
                126 if self.rx.len() >= 4 => (u16::from_be_bytes([self.rx[2], self.rx[3]]) as usize, 4),
                126 => break,
                127 => panic!("64-bit length from server"),
                n => (n as usize, 2),
            };
            if self.rx.len() < head + len {
                break;
            }

            let opcode = self.rx[0] & 0x0f;
            let payload = self.rx[head..head + len].to_vec();
            self.rx.drain(..head + len);
            frames.push((opcode, payload));
        }
        frames
    }

    /// Text frames received so far, parsed as json.
    pub fn messages(&mut self) -> Vec<serde_json::Value> {
        self.frames()
            .into_iter()
            .filter(|(op, _)| *op == OP_TEXT)
            .map(|(_, p)| serde_json::from_slice(&p).unwrap())
            .collect()
    }
}

/// A listener fed by [`MockListener::connect`].
#[derive(Clone, Default)]
pub struct MockListener {
    backlog: Rc<RefCell<VecDeque<(MockConn, SocketAddr)>>>,
    next_port: Rc<Cell<u16>>,
}

impl MockListener {
    pub fn connect(&self) -> Peer {
        let port = 50000 + self.next_port.get();
        self.next_port.set(self.next_port.get() + 1);

        let addr = SocketAddr::from(([192, 168, 4, 2], port));
        let pipe = Rc::new(RefCell::new(Pipe::default()));
        self.backlog
            .borrow_mut()
            .push_back((MockConn(pipe.clone()), addr));

        Peer {
            pipe,
            addr,
            rx: Vec::new(),
        }
    }
}

impl Listener for MockListener {
    type Conn = MockConn;

    fn accept(&mut self) -> io::Result<Option<(MockConn, SocketAddr)>> { Ok(self.backlog.borrow_mut().pop_front()) }

    fn local_addr(&self) -> io::Result<SocketAddr> { Ok(SocketAddr::from(([192, 168, 4, 1], 8080))) }
}

/// A clock the test moves by hand.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn advance(&self, ms: u64) { self.0.set(self.0.get() + ms); }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 { self.0.get() }
}

/// Four channels, channel 2 switched off.
pub struct Bench;

impl Diagnostics for Bench {
    fn channel_states(&self) -> [bool; CHANNELS] { [true, false, true, true] }

    fn read_channel(&self, channel: u8) -> Option<Reading> {
        Some(Reading {
            voltage: 12.0,
            current: 0.5 * channel as f32,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(ClientId, SocketAddr),
    Disconnect(ClientId, SocketAddr),
}

/// Records connect and disconnect callbacks.
#[derive(Clone, Default)]
pub struct Events(Rc<RefCell<Vec<Event>>>);

impl Events {
    pub fn take(&self) -> Vec<Event> { std::mem::take(&mut *self.0.borrow_mut()) }
}

impl ClientListener for Events {
    fn on_connect(&mut self, client: ClientId, addr: SocketAddr) { self.0.borrow_mut().push(Event::Connect(client, addr)); }

    fn on_disconnect(&mut self, client: ClientId, addr: SocketAddr) {
        self.0.borrow_mut().push(Event::Disconnect(client, addr));
    }
}

/// Records commands; only `set_channel` is understood.
#[derive(Clone, Default)]
pub struct Commands(Rc<RefCell<Vec<(String, Option<String>, ClientId)>>>);

impl Commands {
    pub fn take(&self) -> Vec<(String, Option<String>, ClientId)> { std::mem::take(&mut *self.0.borrow_mut()) }
}

impl CommandHandler for Commands {
    fn on_command(&mut self, command: &str, params: Option<&str>, client: ClientId) -> bool {
        self.0
            .borrow_mut()
            .push((command.to_string(), params.map(str::to_string), client));
        command == "set_channel"
    }
}

pub struct Harness {
    pub server: TestServer,
    pub net: MockListener,
    pub clock: ManualClock,
    pub events: Events,
    pub commands: Commands,
}

impl Harness {
    /// A server with the status broadcast switched off.
    pub fn new() -> Self { Self::with_config(Config::default().status_interval_ms(0)) }

    pub fn with_config(config: Config) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let net = MockListener::default();
        let clock = ManualClock::default();
        let events = Events::default();
        let commands = Commands::default();

        let mut server = Server::with_listener(net.clone(), config, Bench, clock.clone()).unwrap();
        server.register_client_listener(events.clone());
        server.register_command_handler(commands.clone());

        Self {
            server,
            net,
            clock,
            events,
            commands,
        }
    }

    /// Connect and complete the handshake.
    pub fn open_client(&mut self) -> Peer {
        let mut peer = self.net.connect();
        peer.send_upgrade();
        self.server.update();

        let response = peer.response().expect("handshake response");
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"), "{}", response);
        assert!(response.contains(&format!("sec-websocket-accept: {}\r\n", SEC_ACCEPT)));
        peer
    }
}
