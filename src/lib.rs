// Encrypted many-to-many rooms over a publish/subscribe event transport
// This file exposes the public API for the binary and integration tests

pub mod cache;
pub mod config;
pub mod crypto;
pub mod event;
pub mod identity;
pub mod room;
pub mod shared;
pub mod transport;

// Re-export commonly used types for easier access in tests
pub use cache::CacheEntry;
pub use config::{RoomConfig, RoomConfigPartial};
pub use crypto::{ChaChaCipher, Cipher, CipherError};
pub use event::{
    listener, Delivery, EventTemplate, Filter, Listener, RawEvent, Signal, CONNECTED, ERROR,
    LEAVE, WILDCARD,
};
pub use identity::RoomIdentity;
pub use room::{Room, RoomBuilder, RoomState};
pub use shared::{RoomError, RoomResult};
pub use transport::{MemoryRelay, RelayMessage, Subscription, Transport, TransportError};
