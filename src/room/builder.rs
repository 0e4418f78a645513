use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::{subscription, Room, RoomInner, RoomState};
use crate::cache::EventCache;
use crate::config::{RoomConfig, RoomConfigPartial};
use crate::crypto::{ChaChaCipher, Cipher};
use crate::event::{ListenerRegistry, PayloadValidator};
use crate::identity::RoomIdentity;
use crate::shared::RoomResult;
use crate::transport::Transport;

/// Builder for joining a room with a non-default cipher or validator
pub struct RoomBuilder {
    transport: Arc<dyn Transport>,
    secret: String,
    config: RoomConfigPartial,
    cipher: Arc<dyn Cipher>,
    validator: Option<Arc<dyn PayloadValidator>>,
}

impl RoomBuilder {
    pub fn new(transport: Arc<dyn Transport>, secret: &str) -> Self {
        Self {
            transport,
            secret: secret.to_string(),
            config: RoomConfigPartial::default(),
            cipher: Arc::new(ChaChaCipher::new()),
            validator: None,
        }
    }

    pub fn with_config(mut self, config: RoomConfigPartial) -> Self {
        self.config = config;
        self
    }

    pub fn with_cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn PayloadValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Builds the room and starts opening its subscription
    ///
    /// Returns before the subscription exists; use [`Room::ready`] to wait for
    /// it. Must be called from within a tokio runtime.
    pub fn join(self) -> RoomResult<Room> {
        let config = RoomConfig::merge(self.config)?;
        let identity = RoomIdentity::derive(&self.secret);
        let room_id = identity.id();
        let (state, _) = watch::channel(RoomState::Connecting);

        info!(
            room_id = %room_id,
            kind = config.kind,
            encryption = config.encryption,
            cache_size = config.cache_size,
            "Joining room"
        );

        let inner = Arc::new(RoomInner {
            identity,
            room_id,
            cache: Mutex::new(EventCache::new(config.cache_size)),
            config,
            transport: self.transport,
            cipher: self.cipher,
            validator: self.validator,
            listeners: ListenerRegistry::new(),
            state,
            subscription_id: Mutex::new(None),
            task: Mutex::new(None),
        });

        let task = subscription::start(Arc::downgrade(&inner));
        *inner.task.lock() = Some(task);

        Ok(Room { inner })
    }
}
