use parking_lot::Mutex;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use roomcast::event::{EventDraft, PayloadValidator};
use roomcast::{
    listener, Listener, RawEvent, RelayMessage, Room, RoomConfigPartial, RoomIdentity,
};

use super::mocks::MockTransport;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const SECRET: &str = "the quick brown fox";
pub const KIND: u16 = 21111;

pub struct RoomSetup {
    pub room: Room,
    pub transport: Arc<MockTransport>,
}

pub struct RoomSetupBuilder {
    config: RoomConfigPartial,
    validator: Option<Arc<dyn PayloadValidator>>,
    transport: MockTransport,
    connect: bool,
}

impl RoomSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: RoomConfigPartial::new().with_encryption(false),
            validator: None,
            transport: MockTransport::new(),
            connect: true,
        }
    }

    pub fn with_config(mut self, config: RoomConfigPartial) -> Self {
        self.config = config;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn PayloadValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Stop after the subscription opens, before end-of-stored-events
    pub fn without_eose(mut self) -> Self {
        self.connect = false;
        self
    }

    pub async fn build(self) -> RoomSetup {
        let transport = Arc::new(self.transport);

        let mut builder = Room::builder(transport.clone(), SECRET).with_config(self.config);
        if let Some(validator) = self.validator {
            builder = builder.with_validator(validator);
        }
        let room = builder.join().expect("room config should be valid");

        let subscribed = transport.clone();
        eventually(move || subscribed.is_subscribed()).await;

        if self.connect {
            transport.eose();
            room.ready().await.expect("room should connect");
        }

        RoomSetup { room, transport }
    }
}

impl RoomSetup {
    pub fn room_id(&self) -> String {
        RoomIdentity::derive(SECRET).id()
    }

    /// Signed plaintext room event from `author` expiring an hour from now
    pub fn event_from(&self, author: &str, event_name: &str, payload: Value) -> RawEvent {
        let content = json!({ "eventName": event_name, "payload": payload }).to_string();
        self.raw_event_from(author, content, chrono::Utc::now().timestamp() as u64 + 3600)
    }

    pub fn raw_event_from(&self, author: &str, content: String, expires_at: u64) -> RawEvent {
        self.raw_event_at(author, content, chrono::Utc::now().timestamp() as u64, expires_at)
    }

    pub fn raw_event_at(
        &self,
        author: &str,
        content: String,
        created_at: u64,
        expires_at: u64,
    ) -> RawEvent {
        MockTransport::sign(
            EventDraft {
                kind: KIND,
                created_at,
                tags: vec![
                    vec!["h".to_string(), self.room_id()],
                    vec!["expiration".to_string(), expires_at.to_string()],
                ],
                content,
            },
            author,
        )
    }

    pub fn deliver(&self, event: RawEvent) {
        self.transport.deliver(RelayMessage::Event(event));
    }

    /// Waits until everything delivered so far has gone through ingestion
    ///
    /// Sends a marker event through the room and waits for its dispatch;
    /// the marker ends up in the cache.
    pub async fn flush(&self) {
        let (sender, receiver) = oneshot::channel();
        let sender = Mutex::new(Some(sender));
        self.room.once("flush", move |_| {
            if let Some(sender) = sender.lock().take() {
                let _ = sender.send(());
            }
        });

        self.deliver(self.event_from(super::mocks::REMOTE_PUBKEY, "flush", Value::Null));

        tokio::time::timeout(Duration::from_secs(2), receiver)
            .await
            .expect("flush marker should be dispatched")
            .expect("flush listener dropped");
    }
}

/// Records every delivery a listener sees as (event name, payload)
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> Listener {
        let seen = self.seen.clone();
        listener(move |delivery| {
            seen.lock().push((
                delivery.event_name.to_string(),
                delivery.payload().cloned().unwrap_or(Value::Null),
            ));
        })
    }

    pub fn seen(&self) -> Vec<(String, Value)> {
        self.seen.lock().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.seen().into_iter().map(|(name, _)| name).collect()
    }
}

/// Polls `condition` until it holds, failing the test after two seconds
pub async fn eventually<F>(condition: F)
where
    F: Fn() -> bool,
{
    wait_until(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

async fn wait_until<F: Future<Output = ()>>(future: F) {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("condition was not met in time");
}
