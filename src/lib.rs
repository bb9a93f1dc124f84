// #![warn(missing_docs)]

//! Single-threaded, non-blocking websocket server for device dashboards.
//!
//! ## Features
//! - No threads, no async runtime, no blocking calls.
//! - Fixed-size buffers for every connection and every queued message.
//! - A small, fixed number of clients; extra connections are refused.
//! - Json messages for logs, channel readings and status snapshots.
//!
//! ## High-level API
//!
//! - [`server`]
//! - [`handler`]
//! - [`publisher`]
//!
//! ```ignore
//! {
//!     let mut server = Server::bind(Config::default(), diagnostics, MonotonicClock::new())?;
//!     server.register_command_handler(|cmd: &str, params: Option<&str>, client: ClientId| {
//!         // toggle a channel, reboot, ...
//!         cmd == "reboot"
//!     });
//!
//!     loop {
//!         server.update();
//!         server.enqueue_log(Level::Info, "main", "tick")?;
//!     }
//! }
//! ```
//!
//! ## Low-level API
//!
//! - [`frame`]
//! - [`handshake`]
//!
//! Frame:
//!
//! ```ignore
//! {
//!     // encode a server frame
//!     let n = frame::encode(b"hello", OpCode::Text, &mut buf)?;
//!
//!     // decode a client frame, unmasking it in place
//!     if let Decoded::Complete { frame, consumed } = frame::decode(&mut buf, 1024)? { ... }
//! }
//! ```
//!
//! Handshake:
//!
//! ```ignore
//! {
//!     // parse a client upgrade request
//!     let mut request = Request::new();
//!     let n = request.decode(&buf)?;
//!
//!     // answer it
//!     let accept = derive_accept_key(request.sec_key);
//!     let n = Response { sec_accept: &accept }.encode(&mut buf)?;
//! }
//! ```

mod buf;

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod handler;
pub mod handshake;
pub mod message;
pub mod publisher;
pub mod queue;
pub mod server;
pub mod table;
pub mod transport;

pub use clock::{Clock, MonotonicClock};
pub use config::Config;
pub use error::{Error, Result};
pub use handler::{ClientListener, CommandHandler};
pub use message::{ClientId, Level, Reading, StatusSnapshot, Target};
pub use publisher::Diagnostics;
pub use server::Server;
pub use transport::{Connection, Listener};
