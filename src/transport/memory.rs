use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{RelayMessage, Subscription, Transport, TransportError};
use crate::event::{EventDraft, Filter, RawEvent};

#[derive(Default)]
struct RelayState {
    events: Vec<RawEvent>,
    // subscription id -> (filter, sender)
    subscriptions: HashMap<String, (Filter, mpsc::UnboundedSender<RelayMessage>)>,
}

/// In-process relay shared by any number of [`MemoryClient`]s
///
/// Stores every published event, replays matching stored events followed by
/// end-of-stored-events on subscribe, then forwards live events.
#[derive(Clone, Default)]
pub struct MemoryRelay {
    state: Arc<Mutex<RelayState>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client whose identity is derived from `name`
    pub fn client(&self, name: &str) -> MemoryClient {
        let pubkey = hex::encode(Sha256::digest(format!("roomcast-memory:{}", name).as_bytes()));
        debug!(name = %name, pubkey = %pubkey, "Created memory client");

        MemoryClient {
            relay: self.clone(),
            pubkey,
        }
    }

    /// Stores `event` and forwards it to matching subscriptions, as-is
    pub fn inject(&self, event: RawEvent) {
        let mut state = self.state.lock();
        let mut closed = Vec::new();

        for (id, (filter, sender)) in &state.subscriptions {
            if filter.matches(&event) && sender.send(RelayMessage::Event(event.clone())).is_err() {
                closed.push(id.clone());
            }
        }
        for id in closed {
            debug!(subscription_id = %id, "Dropping closed subscription");
            state.subscriptions.remove(&id);
        }

        state.events.push(event);
    }

    pub fn stored_events(&self) -> Vec<RawEvent> {
        self.state.lock().events.clone()
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }
}

/// One participant's handle on a [`MemoryRelay`]
///
/// Signatures are a digest binding the event id to the author key. They
/// catch tampering in transit but are not unforgeable.
#[derive(Clone)]
pub struct MemoryClient {
    relay: MemoryRelay,
    pubkey: String,
}

impl MemoryClient {
    pub fn relay(&self) -> &MemoryRelay {
        &self.relay
    }

    /// Signs a draft the way this client would on publish, without sending it
    pub fn sign(&self, draft: EventDraft) -> RawEvent {
        let mut event = RawEvent::from_draft(draft, &self.pubkey, String::new());
        event.sig = signature(&event.pubkey, &event.id);
        event
    }
}

fn signature(pubkey: &str, id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pubkey.as_bytes());
    hasher.update(id.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl Transport for MemoryClient {
    fn pubkey(&self) -> &str {
        &self.pubkey
    }

    async fn subscribe(&self, filter: Filter) -> Result<Subscription, TransportError> {
        let (sender, messages) = mpsc::unbounded_channel();
        let id = Uuid::new_v4().to_string();

        let mut state = self.relay.state.lock();
        for event in state.events.iter().filter(|event| filter.matches(event)) {
            sender
                .send(RelayMessage::Event(event.clone()))
                .map_err(|_| TransportError::Closed)?;
        }
        sender
            .send(RelayMessage::EndOfStoredEvents)
            .map_err(|_| TransportError::Closed)?;
        state.subscriptions.insert(id.clone(), (filter, sender));

        info!(subscription_id = %id, pubkey = %self.pubkey, "Memory subscription opened");
        Ok(Subscription { id, messages })
    }

    fn unsubscribe(&self, subscription_id: &str) {
        if self
            .relay
            .state
            .lock()
            .subscriptions
            .remove(subscription_id)
            .is_some()
        {
            info!(subscription_id = %subscription_id, "Memory subscription closed");
        }
    }

    async fn publish(&self, draft: EventDraft) -> Result<RawEvent, TransportError> {
        let event = self.sign(draft);
        self.relay.inject(event.clone());
        Ok(event)
    }

    fn verify(&self, event: &RawEvent) -> bool {
        signature(&event.pubkey, &event.id) == event.sig
    }
}
