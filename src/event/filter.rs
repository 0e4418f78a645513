use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::raw::RawEvent;

/// Subscription filter in the relay wire shape
///
/// Tag constraints are stored under their wire key, e.g. `"#h"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    #[serde(flatten)]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: u16) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn author(mut self, pubkey: impl Into<String>) -> Self {
        self.authors.push(pubkey.into());
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Some(since);
        self
    }

    /// Replaces the values constrained for single-letter tag `name`
    pub fn tag<I, S>(mut self, name: char, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.insert(
            format!("#{}", name),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn tag_values(&self, name: char) -> Option<&[String]> {
        self.tags.get(&format!("#{}", name)).map(Vec::as_slice)
    }

    pub fn matches(&self, event: &RawEvent) -> bool {
        if !self.ids.is_empty() && !self.ids.contains(&event.id) {
            return false;
        }
        if !self.authors.is_empty() && !self.authors.contains(&event.pubkey) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        if self.since.is_some_and(|since| event.created_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| event.created_at > until) {
            return false;
        }

        self.tags.iter().all(|(key, values)| {
            let Some(name) = key.strip_prefix('#') else {
                return true;
            };
            values.iter().any(|value| event.has_tag(name, value))
        })
    }
}
