use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

use roomcast::event::EventDraft;
use roomcast::{Filter, RawEvent, RelayMessage, Subscription, Transport, TransportError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

pub const LOCAL_PUBKEY: &str = "1111111111111111111111111111111111111111111111111111111111111111";
pub const REMOTE_PUBKEY: &str = "2222222222222222222222222222222222222222222222222222222222222222";

/// Transport that records what the room asks of it and lets tests push
/// relay messages by hand
pub struct MockTransport {
    pubkey: String,
    fail_subscribe: bool,
    fail_publish: AtomicBool,
    signatures_valid: AtomicBool,
    sender: Mutex<Option<mpsc::UnboundedSender<RelayMessage>>>,
    filters: Mutex<Vec<Filter>>,
    published: Mutex<Vec<EventDraft>>,
    unsubscribed: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            pubkey: LOCAL_PUBKEY.to_string(),
            fail_subscribe: false,
            fail_publish: AtomicBool::new(false),
            signatures_valid: AtomicBool::new(true),
            sender: Mutex::new(None),
            filters: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            unsubscribed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_subscribe() -> Self {
        Self {
            fail_subscribe: true,
            ..Self::new()
        }
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn set_signatures_valid(&self, valid: bool) {
        self.signatures_valid.store(valid, Ordering::SeqCst);
    }

    pub fn is_subscribed(&self) -> bool {
        self.sender.lock().is_some()
    }

    pub fn deliver(&self, message: RelayMessage) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(message);
        }
    }

    pub fn eose(&self) {
        self.deliver(RelayMessage::EndOfStoredEvents);
    }

    pub fn filters(&self) -> Vec<Filter> {
        self.filters.lock().clone()
    }

    pub fn published(&self) -> Vec<EventDraft> {
        self.published.lock().clone()
    }

    pub fn unsubscribed(&self) -> Vec<String> {
        self.unsubscribed.lock().clone()
    }

    /// Signs `draft` as `pubkey` with a well-formed but fake signature
    pub fn sign(draft: EventDraft, pubkey: &str) -> RawEvent {
        RawEvent::from_draft(draft, pubkey, "ab".repeat(64))
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn pubkey(&self) -> &str {
        &self.pubkey
    }

    async fn subscribe(&self, filter: Filter) -> Result<Subscription, TransportError> {
        self.filters.lock().push(filter);

        if self.fail_subscribe {
            return Err(TransportError::SubscriptionRejected(
                "mock refuses subscriptions".to_string(),
            ));
        }

        let (sender, messages) = mpsc::unbounded_channel();
        *self.sender.lock() = Some(sender);
        Ok(Subscription {
            id: "mock-subscription".to_string(),
            messages,
        })
    }

    fn unsubscribe(&self, subscription_id: &str) {
        self.unsubscribed.lock().push(subscription_id.to_string());
        self.sender.lock().take();
    }

    async fn publish(&self, draft: EventDraft) -> Result<RawEvent, TransportError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportError::PublishRejected("mock relay offline".to_string()));
        }

        self.published.lock().push(draft.clone());
        Ok(Self::sign(draft, &self.pubkey))
    }

    fn verify(&self, _event: &RawEvent) -> bool {
        self.signatures_valid.load(Ordering::SeqCst)
    }
}
