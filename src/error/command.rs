use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CommandError {
    /// payload is not utf-8
    Utf8(std::str::Utf8Error),

    /// payload looks like json but does not parse as a command
    Json(serde_json::Error),

    /// payload is blank
    Empty,
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use CommandError::*;
        match self {
            Utf8(e) => write!(f, "Command is not valid utf-8: {}", e),
            Json(e) => write!(f, "Malformed command: {}", e),
            Empty => write!(f, "Empty command"),
        }
    }
}

impl From<std::str::Utf8Error> for CommandError {
    fn from(e: std::str::Utf8Error) -> Self { CommandError::Utf8(e) }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self { CommandError::Json(e) }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Utf8(e) => Some(e),
            CommandError::Json(e) => Some(e),
            CommandError::Empty => None,
        }
    }
}
