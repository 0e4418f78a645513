use chrono::Utc;

use super::raw::RawEvent;
use crate::transport::Transport;

/// Read-only view over an inbound event with the checks ingestion gates on
#[derive(Debug, Clone, Copy)]
pub struct SignedEvent<'a> {
    event: &'a RawEvent,
    signature_ok: bool,
    now: u64,
}

impl<'a> SignedEvent<'a> {
    /// Wraps `event`, asking the transport to check its signature
    pub fn wrap(event: &'a RawEvent, transport: &dyn Transport) -> Self {
        Self::at(event, transport.verify(event), unix_now())
    }

    /// Wraps `event` with an already known signature verdict and clock
    pub fn at(event: &'a RawEvent, signature_ok: bool, now: u64) -> Self {
        Self {
            event,
            signature_ok,
            now,
        }
    }

    pub fn event(&self) -> &'a RawEvent {
        self.event
    }

    pub fn is_author(&self, pubkey: &str) -> bool {
        self.event.pubkey == pubkey
    }

    /// Expiration timestamp from the `expiration` tag, if present and numeric
    pub fn expiration(&self) -> Option<u64> {
        self.event
            .tag_value("expiration")
            .and_then(|value| value.parse().ok())
    }

    pub fn is_expired(&self) -> bool {
        self.expiration().is_some_and(|expires_at| expires_at <= self.now)
    }

    pub fn is_valid(&self) -> bool {
        if !is_hex_of_len(&self.event.id, 64) || !is_hex_of_len(&self.event.pubkey, 64) {
            return false;
        }
        if self.event.sig.is_empty() || hex::decode(&self.event.sig).is_err() {
            return false;
        }
        // A present but unparseable expiration tag makes the event unusable
        if self.event.tag_value("expiration").is_some() && self.expiration().is_none() {
            return false;
        }

        let expected_id = RawEvent::compute_id(
            &self.event.pubkey,
            self.event.created_at,
            self.event.kind,
            &self.event.tags,
            &self.event.content,
        );

        expected_id == self.event.id && self.signature_ok
    }
}

pub(crate) fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

fn is_hex_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_hexdigit())
}
