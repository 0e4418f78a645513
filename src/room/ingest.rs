use tracing::{debug, instrument, warn};

use super::RoomInner;
use crate::cache::CacheEntry;
use crate::event::{is_ciphertext, is_reserved, Envelope, RawEvent, Signal, SignedEvent};
use crate::shared::{RoomError, RoomResult};

/// Runs one inbound event through the gates, cache and listeners
///
/// Echoed, expired and invalid events are dropped quietly. Content that
/// cannot be decrypted, parsed or validated is reported on `_error`.
#[instrument(skip(room, event), fields(room_id = %room.room_id, event_id = %event.id))]
pub(crate) async fn handle(room: &RoomInner, event: RawEvent) {
    let signed = SignedEvent::wrap(&event, room.transport.as_ref());

    if !room.config.allow_echo && signed.is_author(room.transport.pubkey()) {
        debug!("Dropping echoed event");
        return;
    }
    if signed.is_expired() {
        debug!("Dropping expired event");
        return;
    }
    if !signed.is_valid() {
        debug!(pubkey = %event.pubkey, "Dropping invalid event");
        return;
    }

    match open_envelope(room, &event.content).await {
        Ok(envelope) => accept(room, envelope, event),
        Err(e) => {
            warn!(error = %e, "Rejected inbound event");
            room.emit_error(e);
        }
    }
}

async fn open_envelope(room: &RoomInner, content: &str) -> RoomResult<Envelope> {
    let plaintext = if is_ciphertext(content) {
        room.cipher
            .decrypt(content, room.identity.cipher_key())
            .await
            .map_err(RoomError::Decrypt)?
    } else {
        content.to_string()
    };

    let envelope = Envelope::from_content(&plaintext).map_err(RoomError::MalformedEnvelope)?;

    if is_reserved(&envelope.event_name) {
        return Err(RoomError::InvalidPayload {
            event_name: envelope.event_name,
            reason: "reserved event name".to_string(),
        });
    }

    if let Some(validator) = &room.validator {
        validator
            .validate(&envelope.event_name, &envelope.payload)
            .map_err(|reason| RoomError::InvalidPayload {
                event_name: envelope.event_name.clone(),
                reason,
            })?;
    }

    Ok(envelope)
}

fn accept(room: &RoomInner, envelope: Envelope, event: RawEvent) {
    let Envelope {
        event_name,
        payload,
    } = envelope;

    let (evicted, capacity) = {
        let mut cache = room.cache.lock();
        let evicted = cache.push(CacheEntry {
            event_name: event_name.clone(),
            payload: payload.clone(),
            envelope: event.clone(),
        });
        (evicted, cache.capacity())
    };
    if let Some(evicted) = evicted {
        debug!(
            evicted_event_id = %evicted.envelope.id,
            capacity,
            "Evicted oldest cached event"
        );
    }

    debug!(event_name = %event_name, "Dispatching inbound event");
    room.listeners.emit(
        &event_name,
        &Signal::Message {
            payload,
            envelope: event,
        },
    );
}
