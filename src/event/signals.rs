use serde_json::Value;
use std::sync::Arc;

use super::raw::RawEvent;
use crate::room::Room;
use crate::shared::RoomError;

/// Registry key that receives every dispatch
pub const WILDCARD: &str = "*";

/// Lifecycle event names; these never carry application data
pub const CONNECTED: &str = "_connected";
pub const ERROR: &str = "_error";
pub const LEAVE: &str = "_leave";

pub fn is_reserved(event_name: &str) -> bool {
    matches!(event_name, WILDCARD | CONNECTED | ERROR | LEAVE)
}

/// What a dispatch carries to its listeners
#[derive(Debug, Clone)]
pub enum Signal {
    /// An accepted inbound envelope
    Message { payload: Value, envelope: RawEvent },

    /// End of stored events was seen; carries the room itself
    Connected(Room),

    Error(Arc<RoomError>),

    Leave,

    /// Anything an application emits by hand
    Custom(Value),
}

/// Argument every listener receives
///
/// Named and wildcard listeners see the same delivery; `event_name` is what
/// a wildcard listener uses to tell dispatches apart.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub event_name: &'a str,
    pub signal: &'a Signal,
}

impl<'a> Delivery<'a> {
    pub fn payload(&self) -> Option<&'a Value> {
        match self.signal {
            Signal::Message { payload, .. } => Some(payload),
            Signal::Custom(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn envelope(&self) -> Option<&'a RawEvent> {
        match self.signal {
            Signal::Message { envelope, .. } => Some(envelope),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&'a RoomError> {
        match self.signal {
            Signal::Error(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    pub fn room(&self) -> Option<&'a Room> {
        match self.signal {
            Signal::Connected(room) => Some(room),
            _ => None,
        }
    }
}
