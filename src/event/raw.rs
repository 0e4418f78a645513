use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single tag, e.g. `["h", "<room id>"]`
pub type Tag = Vec<String>;

/// Signed event as it travels over the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: String,
}

impl RawEvent {
    /// Builds an event from a draft, computing its id for the given author
    pub fn from_draft(draft: EventDraft, pubkey: &str, sig: impl Into<String>) -> Self {
        let id = Self::compute_id(pubkey, draft.created_at, draft.kind, &draft.tags, &draft.content);

        Self {
            id,
            pubkey: pubkey.to_string(),
            created_at: draft.created_at,
            kind: draft.kind,
            tags: draft.tags,
            content: draft.content,
            sig: sig.into(),
        }
    }

    /// sha256 over `[0, pubkey, created_at, kind, tags, content]`, hex encoded
    pub fn compute_id(
        pubkey: &str,
        created_at: u64,
        kind: u16,
        tags: &[Tag],
        content: &str,
    ) -> String {
        let canonical = serde_json::json!([0, pubkey, created_at, kind, tags, content]);
        hex::encode(Sha256::digest(canonical.to_string().as_bytes()))
    }

    /// First value of the first tag named `name`
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.first().map(String::as_str) == Some(name))
            .and_then(|tag| tag.get(1))
            .map(String::as_str)
    }

    pub fn has_tag(&self, name: &str, value: &str) -> bool {
        self.tags.iter().any(|tag| {
            tag.first().map(String::as_str) == Some(name)
                && tag.get(1).map(String::as_str) == Some(value)
        })
    }
}

/// Unsigned event handed to the transport for signing and publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub kind: u16,
    pub created_at: u64,
    pub tags: Vec<Tag>,
    pub content: String,
}

/// Per-call overrides for an outbound event
///
/// Everything except `tags` replaces the room default. `tags` are appended
/// after the configured default tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTemplate {
    pub kind: Option<u16>,
    pub created_at: Option<u64>,
    pub tags: Vec<Tag>,
}

impl EventTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: u16) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_tag<I, S>(mut self, tag: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.push(tag.into_iter().map(Into::into).collect());
        self
    }
}
