use std::sync::Weak;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ingest, RoomInner};
use crate::event::Filter;
use crate::shared::RoomError;
use crate::transport::{RelayMessage, Subscription, Transport};

/// Room filter: the configured filter plus the room kind and `#h` tag
pub(crate) fn room_filter(base: &Filter, kind: u16, room_id: &str) -> Filter {
    let mut filter = base.clone();
    filter.kinds.push(kind);
    filter.tag('h', [room_id])
}

pub(crate) async fn open(
    transport: &dyn Transport,
    filter: Filter,
) -> Result<Subscription, RoomError> {
    transport.subscribe(filter).await.map_err(RoomError::Subscribe)
}

/// Spawns the task that opens the room subscription and routes its messages
///
/// Only a weak reference is held while waiting for messages, so dropping
/// every `Room` handle ends the task.
pub(crate) fn start(room: Weak<RoomInner>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut messages = {
            let Some(inner) = room.upgrade() else {
                return;
            };
            let filter = room_filter(&inner.config.filter, inner.config.kind, &inner.room_id);
            debug!(room_id = %inner.room_id, filter = ?filter, "Opening room subscription");

            match open(inner.transport.as_ref(), filter).await {
                Ok(subscription) => {
                    info!(
                        room_id = %inner.room_id,
                        subscription_id = %subscription.id,
                        "Room subscription opened"
                    );
                    *inner.subscription_id.lock() = Some(subscription.id);
                    subscription.messages
                }
                Err(e) => {
                    inner.mark_failed(e);
                    return;
                }
            }
        };

        while let Some(message) = messages.recv().await {
            let Some(inner) = room.upgrade() else {
                break;
            };

            match message {
                RelayMessage::Event(event) => ingest::handle(&inner, event).await,
                RelayMessage::EndOfStoredEvents => inner.mark_connected(),
            }
        }

        warn!("Room subscription ended - no more events");
    })
}
