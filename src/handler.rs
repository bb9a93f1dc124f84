//! Application callbacks.
//!
//! Both run synchronously inside [`Server::update`](crate::server::Server::update)
//! and must not block.

use std::net::SocketAddr;

use crate::message::ClientId;

/// Handles commands the server does not answer itself.
pub trait CommandHandler {
    /// Return whether the command was understood.
    fn on_command(&mut self, command: &str, params: Option<&str>, client: ClientId) -> bool;
}

/// Observes clients entering and leaving the open state.
pub trait ClientListener {
    fn on_connect(&mut self, client: ClientId, addr: SocketAddr);

    fn on_disconnect(&mut self, client: ClientId, addr: SocketAddr);
}

impl<F> CommandHandler for F
where
    F: FnMut(&str, Option<&str>, ClientId) -> bool,
{
    #[inline]
    fn on_command(&mut self, command: &str, params: Option<&str>, client: ClientId) -> bool {
        self(command, params, client)
    }
}
