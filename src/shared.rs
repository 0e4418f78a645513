use thiserror::Error;

use crate::crypto::CipherError;
use crate::transport::TransportError;

pub type RoomResult<T> = Result<T, RoomError>;

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Room is not connected")]
    NotConnected,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Subscription failed: {0}")]
    Subscribe(#[source] TransportError),

    #[error("Publish failed: {0}")]
    Publish(#[source] TransportError),

    #[error("Encryption failed: {0}")]
    Encrypt(#[source] CipherError),

    #[error("Decryption failed: {0}")]
    Decrypt(#[source] CipherError),

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("Payload rejected for '{event_name}': {reason}")]
    InvalidPayload { event_name: String, reason: String },

    #[error("Room initialization failed: {0}")]
    Initialization(String),
}

impl RoomError {
    /// Whether this error comes from API misuse rather than from data in flight
    pub fn is_usage_error(&self) -> bool {
        matches!(self, RoomError::NotConnected | RoomError::InvalidConfig(_))
    }
}
