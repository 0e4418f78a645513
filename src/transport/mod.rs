// Publish/subscribe transport the room rides on
//
// The room never talks to the network directly; it goes through `Transport`.
// `MemoryRelay` is a loopback implementation used by the demo and tests.

pub use memory::{MemoryClient, MemoryRelay};

mod memory;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::event::{EventDraft, Filter, RawEvent};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("Publish rejected: {0}")]
    PublishRejected(String),

    #[error("Transport closed")]
    Closed,
}

/// Message delivered on an open subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Event(RawEvent),
    /// Stored events have all been sent; only live events follow
    EndOfStoredEvents,
}

/// Open subscription: its id plus the stream of relay messages
#[derive(Debug)]
pub struct Subscription {
    pub id: String,
    pub messages: mpsc::UnboundedReceiver<RelayMessage>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Hex public key of the local participant
    fn pubkey(&self) -> &str;

    /// Opens a subscription for `filter`
    ///
    /// Must be cancel-safe: the room may drop this future on `leave` before it
    /// learns the subscription id, so nothing may be registered remotely that
    /// only `unsubscribe` would release.
    async fn subscribe(&self, filter: Filter) -> Result<Subscription, TransportError>;

    fn unsubscribe(&self, subscription_id: &str);

    /// Signs `draft` as the local participant and publishes it
    async fn publish(&self, draft: EventDraft) -> Result<RawEvent, TransportError>;

    /// Signature check for an event received from the transport
    fn verify(&self, event: &RawEvent) -> bool;
}
