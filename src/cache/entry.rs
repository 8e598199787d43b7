//! Cache entry types
//!
//! A `CacheEntry` is a timestamped payload tagged with where it came from, so
//! callers can tell live data apart from data served during an outage.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Stored from a successful upstream fetch
    Fresh,
    /// Served from storage after a non-rate-limit failure
    Cached,
    /// Served from storage after the upstream signaled rate limiting
    Fallback,
}

impl Source {
    /// Lowercase label, matching the serialized form
    pub fn label(&self) -> &'static str {
        match self {
            Source::Fresh => "fresh",
            Source::Cached => "cached",
            Source::Fallback => "fallback",
        }
    }

    /// Whether data with this provenance is anything other than live
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Source::Fresh)
    }
}

/// Diagnostic annotations attached to an entry
///
/// Nothing in the cache reads these back for correctness; they exist so the
/// presentation layer can explain why data is degraded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// The upstream refused the latest request because of rate limiting
    #[serde(default)]
    pub api_limit_exceeded: bool,
    /// When the payload was last obtained from a successful fetch
    #[serde(default)]
    pub last_successful_fetch: Option<DateTime<Utc>>,
    /// Message of the failure that caused a degraded read
    #[serde(default)]
    pub error_message: Option<String>,
}

impl EntryMetadata {
    /// Metadata for an entry stored while the upstream is rate limiting
    pub fn rate_limited() -> Self {
        Self {
            api_limit_exceeded: true,
            ..Self::default()
        }
    }
}

/// A cached payload with its provenance and expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// When the payload was written by a real store (re-tagging keeps it)
    pub timestamp: DateTime<Utc>,
    /// Where the payload came from
    pub source: Source,
    /// After this instant the entry is logically absent
    pub expires_at: DateTime<Utc>,
    /// Optional diagnostics
    #[serde(default)]
    pub metadata: EntryMetadata,
}

impl<T> CacheEntry<T> {
    /// Builds an entry written at `timestamp` with the given TTL
    pub fn new(
        data: T,
        timestamp: DateTime<Utc>,
        source: Source,
        ttl: Duration,
        metadata: EntryMetadata,
    ) -> Self {
        Self {
            data,
            timestamp,
            source,
            expires_at: deadline(timestamp, ttl),
            metadata,
        }
    }

    /// True once `now` is past `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Age of the payload at `now`, measured from the last real write
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }

    /// Age of the payload right now
    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    /// Human-readable age, e.g. "12m ago"
    pub fn describe_age(&self) -> String {
        format_age(self.age())
    }

    /// When the payload was last fetched from upstream, if known
    ///
    /// Only a `Fresh` entry vouches for its own timestamp; degraded entries
    /// rely on what their metadata recorded.
    pub(crate) fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .last_successful_fetch
            .or_else(|| (self.source == Source::Fresh).then_some(self.timestamp))
    }

    /// Changes provenance while keeping `timestamp`; expiry is re-derived from it
    pub(crate) fn retag(&mut self, source: Source, ttl: Duration, metadata: EntryMetadata) {
        self.source = source;
        self.expires_at = deadline(self.timestamp, ttl);
        self.metadata = metadata;
    }
}

/// `from + ttl`, saturating at the latest representable instant
pub(crate) fn deadline(from: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Formats an age compactly for trust indicators
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..=4 => "just now".to_string(),
        5..=59 => format!("{}s ago", secs),
        60..=3_599 => format!("{}m ago", secs / 60),
        3_600..=86_399 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
