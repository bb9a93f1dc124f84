//! Command dispatcher.
//!
//! A text frame from a client carries one command, either as json
//!
//! ```text
//! {"command":"set_channel","params":"2 on"}
//! ```
//!
//! or as a bare line, name first:
//!
//! ```text
//! set_channel 2 on
//! ```
//!
//! Built-in queries are answered by the server; everything else goes to
//! the registered [`CommandHandler`].

use std::borrow::Cow;

use serde::Deserialize;

use crate::error::CommandError;
use crate::handler::CommandHandler;
use crate::message::ClientId;

#[derive(Deserialize)]
struct JsonCommand<'a> {
    #[serde(borrow)]
    command: Cow<'a, str>,

    #[serde(borrow, default)]
    params: Option<Cow<'a, str>>,
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: Cow<'a, str>,
    pub params: Option<Cow<'a, str>>,
}

impl<'a> Command<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self, CommandError> {
        let text = std::str::from_utf8(payload)?.trim();

        if text.starts_with('{') {
            let JsonCommand { command, params } = serde_json::from_str(text)?;
            if command.trim().is_empty() {
                return Err(CommandError::Empty);
            }
            return Ok(Command {
                name: command,
                params,
            });
        }

        if text.is_empty() {
            return Err(CommandError::Empty);
        }

        let (name, params) = match text.split_once(char::is_whitespace) {
            Some((name, rest)) => {
                let rest = rest.trim();
                (name, (!rest.is_empty()).then_some(rest))
            }
            None => (text, None),
        };

        Ok(Command {
            name: Cow::Borrowed(name),
            params: params.map(Cow::Borrowed),
        })
    }

    #[inline]
    pub fn params(&self) -> Option<&str> { self.params.as_deref() }
}

/// Queries the server answers without consulting the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// a status snapshot for the asking client
    Status,

    /// the latest reading of every channel for the asking client
    Channels,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        const TABLE: &[(&str, Builtin)] = &[
            ("status", Builtin::Status),
            ("get_status", Builtin::Status),
            ("channels", Builtin::Channels),
            ("get_channels", Builtin::Channels),
        ];
        TABLE
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, b)| *b)
    }
}

/// What became of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// the server must answer it
    Builtin(Builtin),

    /// the handler took it
    Handled,

    /// nobody recognized it
    Unhandled(Cow<'a, str>),
}

/// Routes commands to built-ins or the registered handler.
#[derive(Default)]
pub struct Dispatcher {
    handler: Option<Box<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self { Self::default() }

    /// Replace the command handler.
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) { self.handler = Some(handler); }

    pub fn dispatch<'a>(&mut self, payload: &'a [u8], client: ClientId) -> Result<Outcome<'a>, CommandError> {
        let command = Command::parse(payload)?;

        if let Some(builtin) = Builtin::from_name(&command.name) {
            return Ok(Outcome::Builtin(builtin));
        }

        let handled = match self.handler.as_mut() {
            Some(h) => h.on_command(&command.name, command.params(), client),
            None => false,
        };

        if handled {
            Ok(Outcome::Handled)
        } else {
            Ok(Outcome::Unhandled(command.name))
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
