use serde::Deserialize;
use std::time::Duration;

use crate::event::{Filter, Tag};
use crate::shared::{RoomError, RoomResult};

/// Transport event kind used when the caller does not pick one
pub const DEFAULT_KIND: u16 = 21111;

/// Effective room configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RoomConfig {
    /// Maximum number of accepted envelopes kept in the cache
    pub cache_size: usize,
    /// Deliver events authored by the local participant back to it
    pub allow_echo: bool,
    pub encryption: bool,
    /// Added to the current time for the outbound `expiration` tag
    pub expiration: Duration,
    /// Merged into the room subscription filter
    pub filter: Filter,
    /// Members silent for longer than this are left out of `members()`
    pub inactive_limit: Option<Duration>,
    pub kind: u16,
    /// Prepended to the tags of every outbound event
    pub tags: Vec<Tag>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            cache_size: 100,
            allow_echo: false,
            encryption: true,
            expiration: Duration::from_secs(60 * 60), // 1 hour
            filter: Filter::default(),
            inactive_limit: None,
            kind: DEFAULT_KIND,
            tags: Vec::new(),
        }
    }
}

impl RoomConfig {
    /// Applies caller-supplied values over the defaults
    pub fn merge(partial: RoomConfigPartial) -> RoomResult<Self> {
        let defaults = Self::default();

        let config = Self {
            cache_size: partial.cache_size.unwrap_or(defaults.cache_size),
            allow_echo: partial.allow_echo.unwrap_or(defaults.allow_echo),
            encryption: partial.encryption.unwrap_or(defaults.encryption),
            expiration: partial
                .expiration_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.expiration),
            filter: partial.filter.unwrap_or(defaults.filter),
            inactive_limit: partial
                .inactive_limit_secs
                .map(Duration::from_secs)
                .or(defaults.inactive_limit),
            kind: partial.kind.unwrap_or(defaults.kind),
            tags: partial.tags.unwrap_or(defaults.tags),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RoomResult<()> {
        if self.cache_size == 0 {
            return Err(RoomError::InvalidConfig(
                "cache_size must be at least 1".to_string(),
            ));
        }
        // Expiration tags have second resolution and expire at `<= now`
        if self.expiration < Duration::from_secs(1) {
            return Err(RoomError::InvalidConfig(
                "expiration must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Caller-supplied configuration; unset fields fall back to the defaults
///
/// Deserializes from camelCase JSON with durations in seconds, e.g.
/// `{"cacheSize": 50, "allowEcho": true, "expirationSecs": 300}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomConfigPartial {
    pub cache_size: Option<usize>,
    pub allow_echo: Option<bool>,
    pub encryption: Option<bool>,
    pub expiration_secs: Option<u64>,
    pub filter: Option<Filter>,
    pub inactive_limit_secs: Option<u64>,
    pub kind: Option<u16>,
    pub tags: Option<Vec<Tag>>,
}

impl RoomConfigPartial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = Some(cache_size);
        self
    }

    pub fn with_allow_echo(mut self, allow_echo: bool) -> Self {
        self.allow_echo = Some(allow_echo);
        self
    }

    pub fn with_encryption(mut self, encryption: bool) -> Self {
        self.encryption = Some(encryption);
        self
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration_secs = Some(whole_secs(expiration));
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_inactive_limit(mut self, limit: Duration) -> Self {
        self.inactive_limit_secs = Some(whole_secs(limit));
        self
    }

    pub fn with_kind(mut self, kind: u16) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Rounds up to whole seconds so a sub-second duration never becomes zero
fn whole_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
