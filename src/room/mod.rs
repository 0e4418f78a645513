// Room: the encrypted event pipeline over a transport subscription
//
// `Room` is a cheap handle around shared state. Construction returns right
// away in the `Connecting` state; a background task opens the subscription
// and feeds ingestion. Publishing is allowed once end-of-stored-events has
// been seen.

pub use builder::RoomBuilder;

// Internal modules
mod builder;
mod ingest;
mod publish;
mod subscription;

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cache::{CacheEntry, EventCache};
use crate::config::{RoomConfig, RoomConfigPartial};
use crate::crypto::Cipher;
use crate::event::{
    unix_now, Delivery, EventTemplate, Listener, ListenerRegistry, PayloadValidator, RawEvent,
    Signal, TimedListener, CONNECTED, ERROR, LEAVE,
};
use crate::identity::RoomIdentity;
use crate::shared::{RoomError, RoomResult};
use crate::transport::Transport;

/// Connection state of a room
#[derive(Debug, Clone)]
pub enum RoomState {
    /// Subscription requested, stored events not yet drained
    Connecting,
    Connected,
    /// The subscription could not be opened
    Failed(Arc<RoomError>),
    Left,
}

pub(crate) struct RoomInner {
    identity: RoomIdentity,
    room_id: String,
    config: RoomConfig,
    transport: Arc<dyn Transport>,
    cipher: Arc<dyn Cipher>,
    validator: Option<Arc<dyn PayloadValidator>>,
    cache: Mutex<EventCache>,
    listeners: ListenerRegistry,
    state: watch::Sender<RoomState>,
    subscription_id: Mutex<Option<String>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RoomInner {
    fn is_connected(&self) -> bool {
        matches!(*self.state.borrow(), RoomState::Connected)
    }

    fn emit_error(&self, error: RoomError) {
        self.listeners.emit(ERROR, &Signal::Error(Arc::new(error)));
    }

    /// First end-of-stored-events flips the room to connected; later ones are ignored
    fn mark_connected(self: &Arc<Self>) {
        let transitioned = self.state.send_if_modified(|state| {
            if matches!(state, RoomState::Connecting) {
                *state = RoomState::Connected;
                true
            } else {
                false
            }
        });

        if transitioned {
            info!(room_id = %self.room_id, "Room connected");
            let room = Room {
                inner: self.clone(),
            };
            self.listeners.emit(CONNECTED, &Signal::Connected(room));
        }
    }

    fn mark_failed(&self, error: RoomError) {
        error!(room_id = %self.room_id, error = %error, "Room initialization failed");
        let error = Arc::new(error);
        self.state.send_replace(RoomState::Failed(error.clone()));
        self.listeners.emit(ERROR, &Signal::Error(error));
    }

    fn close_subscription(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        if let Some(id) = self.subscription_id.lock().take() {
            self.transport.unsubscribe(&id);
        }
    }
}

impl Drop for RoomInner {
    fn drop(&mut self) {
        self.close_subscription();
    }
}

/// Handle on a joined room; clones share the same room
#[derive(Clone)]
pub struct Room {
    inner: Arc<RoomInner>,
}

impl Room {
    /// Joins the room derived from `secret` with the default cipher
    pub fn new(
        transport: Arc<dyn Transport>,
        secret: &str,
        config: RoomConfigPartial,
    ) -> RoomResult<Self> {
        RoomBuilder::new(transport, secret).with_config(config).join()
    }

    pub fn builder(transport: Arc<dyn Transport>, secret: &str) -> RoomBuilder {
        RoomBuilder::new(transport, secret)
    }

    /// Hex room id, as used in the `h` tag
    pub fn id(&self) -> &str {
        &self.inner.room_id
    }

    pub fn identity(&self) -> &RoomIdentity {
        &self.inner.identity
    }

    pub fn config(&self) -> &RoomConfig {
        &self.inner.config
    }

    pub fn pubkey(&self) -> &str {
        self.inner.transport.pubkey()
    }

    pub fn connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub fn state(&self) -> RoomState {
        self.inner.state.borrow().clone()
    }

    /// Waits until the room is connected or its initialization failed
    pub async fn ready(&self) -> RoomResult<()> {
        let mut state = self.inner.state.subscribe();
        let settled = state
            .wait_for(|state| !matches!(state, RoomState::Connecting))
            .await
            .map_err(|_| RoomError::Initialization("room state closed".to_string()))?;

        match &*settled {
            RoomState::Connected => Ok(()),
            RoomState::Failed(error) => Err(RoomError::Initialization(error.to_string())),
            RoomState::Left | RoomState::Connecting => Err(RoomError::NotConnected),
        }
    }

    /// Distinct authors currently represented in the cache
    pub fn members(&self) -> Vec<String> {
        self.inner
            .cache
            .lock()
            .members(self.inner.config.inactive_limit, unix_now())
    }

    /// Cached envelopes, oldest first
    pub fn history(&self) -> Vec<CacheEntry> {
        self.inner.cache.lock().snapshot()
    }

    /// Publishes `payload` under `event_name`
    ///
    /// Fails only when the room is not connected. Any later failure is sent
    /// to `_error` listeners and yields `Ok(None)`.
    pub async fn publish<T>(
        &self,
        event_name: &str,
        payload: &T,
        template: EventTemplate,
    ) -> RoomResult<Option<RawEvent>>
    where
        T: Serialize + ?Sized,
    {
        publish::publish(&self.inner, event_name, payload, template).await
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.inner.listeners
    }

    pub fn on(&self, event_name: &str, listener: &Listener) -> bool {
        self.inner.listeners.on(event_name, listener)
    }

    pub fn once<F>(&self, event_name: &str, f: F) -> Listener
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        self.inner.listeners.once(event_name, f)
    }

    pub fn within<F>(&self, event_name: &str, f: F, timeout: Duration) -> TimedListener
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        self.inner.listeners.within(event_name, f, timeout)
    }

    pub fn remove(&self, event_name: &str, listener: &Listener) -> bool {
        self.inner.listeners.remove(event_name, listener)
    }

    pub fn prune(&self, event_name: &str) {
        self.inner.listeners.prune(event_name)
    }

    pub fn emit(&self, event_name: &str, signal: Signal) {
        self.inner.listeners.emit(event_name, &signal)
    }

    /// Cancels the subscription and marks the room as no longer connected
    ///
    /// Cache and listeners are kept. Calling it again is a no-op.
    pub fn leave(&self) {
        self.inner.close_subscription();

        let previous = self.inner.state.send_replace(RoomState::Left);
        if matches!(previous, RoomState::Left) {
            return;
        }

        info!(room_id = %self.inner.room_id, "Left room");
        self.inner.listeners.emit(LEAVE, &Signal::Leave);
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.inner.room_id)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}
