use serde::Serialize;
use tracing::{debug, error, instrument};

use super::RoomInner;
use crate::config::RoomConfig;
use crate::event::{is_reserved, unix_now, Envelope, EventDraft, EventTemplate, RawEvent, Tag};
use crate::shared::{RoomError, RoomResult};

/// Tags the room sets itself; configured or override copies are dropped
const ROOM_TAGS: [&str; 2] = ["h", "expiration"];

#[instrument(skip(room, payload, template), fields(room_id = %room.room_id))]
pub(crate) async fn publish<T>(
    room: &RoomInner,
    event_name: &str,
    payload: &T,
    template: EventTemplate,
) -> RoomResult<Option<RawEvent>>
where
    T: Serialize + ?Sized,
{
    if !room.is_connected() {
        return Err(RoomError::NotConnected);
    }

    match submit(room, event_name, payload, template).await {
        Ok(event) => {
            debug!(event_id = %event.id, "Published event");
            Ok(Some(event))
        }
        Err(e) => {
            error!(error = %e, "Publish failed");
            room.emit_error(e);
            Ok(None)
        }
    }
}

async fn submit<T>(
    room: &RoomInner,
    event_name: &str,
    payload: &T,
    template: EventTemplate,
) -> RoomResult<RawEvent>
where
    T: Serialize + ?Sized,
{
    if is_reserved(event_name) {
        return Err(RoomError::InvalidPayload {
            event_name: event_name.to_string(),
            reason: "reserved event name".to_string(),
        });
    }

    let payload = serde_json::to_value(payload).map_err(RoomError::Serialize)?;
    let content = Envelope::new(event_name, payload)
        .to_content()
        .map_err(RoomError::Serialize)?;

    let content = if room.config.encryption {
        room.cipher
            .encrypt(&content, room.identity.cipher_key())
            .await
            .map_err(RoomError::Encrypt)?
    } else {
        content
    };

    let draft = build_draft(&room.config, &room.room_id, template, content, unix_now());
    room.transport
        .publish(draft)
        .await
        .map_err(RoomError::Publish)
}

/// Assembles the outbound draft
///
/// Tags are: configured tags, then template tags, then exactly one `h` and
/// one `expiration` tag.
pub(crate) fn build_draft(
    config: &RoomConfig,
    room_id: &str,
    template: EventTemplate,
    content: String,
    now: u64,
) -> EventDraft {
    let expires_at = now.saturating_add(config.expiration.as_secs());

    let mut tags: Vec<Tag> = config
        .tags
        .iter()
        .cloned()
        .chain(template.tags)
        .filter(|tag| {
            tag.first()
                .map_or(true, |name| !ROOM_TAGS.contains(&name.as_str()))
        })
        .collect();
    tags.push(vec!["h".to_string(), room_id.to_string()]);
    tags.push(vec!["expiration".to_string(), expires_at.to_string()]);

    EventDraft {
        kind: template.kind.unwrap_or(config.kind),
        created_at: template.created_at.unwrap_or(now),
        tags,
        content,
    }
}
