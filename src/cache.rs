use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use crate::event::RawEvent;

/// Accepted inbound envelope as kept by the room
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub event_name: String,
    pub payload: Value,
    pub envelope: RawEvent,
}

/// Most recent accepted envelopes, oldest first, bounded by `capacity`
#[derive(Debug)]
pub struct EventCache {
    entries: VecDeque<CacheEntry>,
    capacity: usize,
}

impl EventCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `entry`, returning the oldest entry if it had to be evicted
    pub fn push(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<CacheEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Distinct authors in the cache, in first-seen order
    ///
    /// With `inactive_limit`, only envelopes created within that window of
    /// `now` count towards membership.
    pub fn members(&self, inactive_limit: Option<Duration>, now: u64) -> Vec<String> {
        let mut seen = HashSet::new();

        self.entries
            .iter()
            .filter(|entry| match inactive_limit {
                Some(limit) => entry.envelope.created_at.saturating_add(limit.as_secs()) >= now,
                None => true,
            })
            .filter(|entry| seen.insert(entry.envelope.pubkey.as_str()))
            .map(|entry| entry.envelope.pubkey.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDraft;
    use serde_json::json;

    fn entry(n: u64, author: &str, created_at: u64) -> CacheEntry {
        CacheEntry {
            event_name: format!("event-{}", n),
            payload: json!(n),
            envelope: RawEvent::from_draft(
                EventDraft {
                    kind: 21111,
                    created_at,
                    tags: vec![],
                    content: n.to_string(),
                },
                author,
                "sig",
            ),
        }
    }

    #[test]
    fn test_cache_keeps_most_recent_window() {
        let mut cache = EventCache::new(3);

        for n in 1..=7 {
            cache.push(entry(n, "alice", 0));
            assert!(cache.len() <= 3);
        }

        let names: Vec<_> = cache.iter().map(|e| e.event_name.as_str()).collect();
        assert_eq!(names, vec!["event-5", "event-6", "event-7"]);
    }

    #[test]
    fn test_push_reports_eviction() {
        let mut cache = EventCache::new(1);

        assert!(cache.push(entry(1, "alice", 0)).is_none());
        let evicted = cache.push(entry(2, "alice", 0)).unwrap();

        assert_eq!(evicted.event_name, "event-1");
        assert_eq!(cache.len(), cache.capacity());
    }

    #[test]
    fn test_members_are_distinct_in_first_seen_order() {
        let mut cache = EventCache::new(10);
        cache.push(entry(1, "bob", 0));
        cache.push(entry(2, "alice", 0));
        cache.push(entry(3, "bob", 0));

        assert_eq!(cache.members(None, 0), vec!["bob", "alice"]);
    }

    #[test]
    fn test_members_exclude_stale_authors() {
        let mut cache = EventCache::new(10);
        cache.push(entry(1, "stale", 1_000));
        cache.push(entry(2, "fresh", 1_950));
        cache.push(entry(3, "boundary", 1_940));

        let members = cache.members(Some(Duration::from_secs(60)), 2_000);

        assert_eq!(members, vec!["fresh", "boundary"]);
    }
}
