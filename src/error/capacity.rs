use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// every client slot is occupied
    TableFull,

    /// outbound queue is full, the new message was dropped
    QueueFull,

    /// encoded message does not fit in a queue slot
    PayloadTooLarge,
}

impl Display for CapacityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use CapacityError::*;
        match self {
            TableFull => write!(f, "No free client slot"),
            QueueFull => write!(f, "Message queue is full"),
            PayloadTooLarge => write!(f, "Message payload is too large"),
        }
    }
}

// use default impl
impl std::error::Error for CapacityError {}
