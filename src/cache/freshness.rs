//! Freshness-tracking cache with graceful degradation
//!
//! `FreshnessCache` wraps an unreliable, rate-limited upstream. Every entry it
//! hands out says how trustworthy it is: `Fresh` from a successful fetch,
//! `Fallback` when the upstream is throttling, `Cached` when the upstream failed
//! for another reason and stale data is acceptable.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::classify::Classify;
use super::config::CacheConfig;
use super::entry::{CacheEntry, EntryMetadata, Source};

/// Default ceiling on the age of data accepted for a degraded read (24 hours)
pub const DEFAULT_MAX_STALENESS: Duration = Duration::from_secs(24 * 60 * 60);

type RateLimitHook<T> = Box<dyn Fn(Option<&CacheEntry<T>>) -> Option<T> + Send + Sync>;

/// Per-call options for `FreshnessCache::get_with_fallback`
pub struct FallbackOptions<T> {
    allow_stale: bool,
    max_staleness: Duration,
    on_rate_limit: Option<RateLimitHook<T>>,
}

impl<T> Default for FallbackOptions<T> {
    fn default() -> Self {
        Self {
            allow_stale: true,
            max_staleness: DEFAULT_MAX_STALENESS,
            on_rate_limit: None,
        }
    }
}

impl<T> fmt::Debug for FallbackOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackOptions")
            .field("allow_stale", &self.allow_stale)
            .field("max_staleness", &self.max_staleness)
            .field("on_rate_limit", &self.on_rate_limit.is_some())
            .finish()
    }
}

impl<T> FallbackOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a non-rate-limit failure may be answered with stale data
    pub fn allow_stale(mut self, allow_stale: bool) -> Self {
        self.allow_stale = allow_stale;
        self
    }

    /// Oldest data accepted for a degraded read
    ///
    /// This is a read-time ceiling, independent of the fallback storage TTL.
    pub fn max_staleness(mut self, max_staleness: Duration) -> Self {
        self.max_staleness = max_staleness;
        self
    }

    /// Hook invoked on rate limiting with the cached entry, if any
    ///
    /// Returning `Some(data)` stores and returns that payload tagged `Fallback`.
    pub fn on_rate_limit<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&CacheEntry<T>>) -> Option<T> + Send + Sync + 'static,
    {
        self.on_rate_limit = Some(Box::new(hook));
        self
    }
}

/// Point-in-time classification of all stored entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub cached_entries: usize,
    pub fallback_entries: usize,
    /// Past their expiry but not yet swept; not counted in the source buckets
    pub expired_entries: usize,
}

/// In-memory key-value store of provenance-tagged entries
///
/// All map operations are atomic per key, so one instance can be shared
/// across tasks behind an `Arc`. Concurrent `get_with_fallback` calls for the
/// same key each invoke their own fetch.
#[derive(Debug)]
pub struct FreshnessCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    config: CacheConfig,
}

impl<T: Clone> Default for FreshnessCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<T: Clone> FreshnessCache<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Stores `data` as fresh
    pub fn set(&self, key: &str, data: T) {
        self.store(key, data, Source::Fresh, EntryMetadata::default());
    }

    /// Stores `data` with an explicit provenance tag
    ///
    /// `Fallback` entries get the long fallback TTL; everything else uses `max_age`.
    pub fn set_tagged(&self, key: &str, data: T, source: Source, metadata: EntryMetadata) {
        self.store(key, data, source, metadata);
    }

    /// Reads an entry, lazily deleting it if expired
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        let now = Utc::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired_at(now) {
                return Some(entry.value().clone());
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired_at(now));
        None
    }

    /// Fetches through `fetch`, degrading to stored data when it fails
    ///
    /// # Behavior
    /// - Success: the result is stored and returned as `Fresh`
    /// - Rate limited: the stored entry is re-tagged `Fallback` and returned, or
    ///   replaced by the `on_rate_limit` hook's payload
    /// - Other failure: with `allow_stale`, stored data younger than
    ///   `max_staleness` is returned as `Cached` without touching the store
    ///
    /// # Errors
    /// Returns the fetch error unchanged when no degraded answer exists.
    pub async fn get_with_fallback<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        options: FallbackOptions<T>,
    ) -> Result<CacheEntry<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let error = match fetch().await {
            Ok(data) => {
                tracing::debug!(key, "stored fresh entry");
                return Ok(self.store(key, data, Source::Fresh, EntryMetadata::default()));
            }
            Err(error) => error,
        };

        let message = error.to_string();
        let now = Utc::now();

        if error.is_rate_limited() {
            let derived = self.mark_rate_limited(key, &message, options.max_staleness, now);

            if let Some(hook) = &options.on_rate_limit {
                if let Some(data) = hook(derived.as_ref()) {
                    tracing::info!(key, error = %message, "rate limited, serving substitute payload");
                    let metadata = EntryMetadata {
                        api_limit_exceeded: true,
                        last_successful_fetch: derived
                            .as_ref()
                            .and_then(|entry| entry.metadata.last_successful_fetch),
                        error_message: Some(message),
                    };
                    return Ok(self.store(key, data, Source::Fallback, metadata));
                }
            }

            if let Some(entry) = derived {
                tracing::info!(key, error = %message, "rate limited, serving fallback entry");
                return Ok(entry);
            }
            tracing::warn!(key, error = %message, "rate limited with no fallback entry");
        } else {
            tracing::warn!(key, error = %message, "fetch failed");
        }

        if options.allow_stale {
            if let Some(entry) = self.stale_read(key, &message, options.max_staleness, now) {
                tracing::info!(key, "serving stale cached entry");
                return Ok(entry);
            }
        }

        Err(error)
    }

    /// True if a live entry tagged `Fresh` exists
    pub fn is_fresh(&self, key: &str) -> bool {
        self.get(key)
            .map(|entry| entry.source == Source::Fresh)
            .unwrap_or(false)
    }

    /// True if any live entry exists
    pub fn is_available(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes expired entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Classifies all entries without evicting anything
    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            stats.total_entries += 1;
            if entry.is_expired_at(now) {
                stats.expired_entries += 1;
                continue;
            }
            match entry.source {
                Source::Fresh => stats.fresh_entries += 1,
                Source::Cached => stats.cached_entries += 1,
                Source::Fallback => stats.fallback_entries += 1,
            }
        }
        stats
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every live entry
    pub fn export(&self) -> Vec<(String, CacheEntry<T>)> {
        let now = Utc::now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Loads a previously exported entry as fallback data
    ///
    /// The entry keeps its timestamp. It is rejected if it is older than
    /// `fallback_max_age` or if the store already holds newer data for `key`.
    pub fn restore(&self, key: &str, mut entry: CacheEntry<T>) -> bool {
        if entry.age_at(Utc::now()) >= self.config.fallback_max_age {
            return false;
        }
        let metadata = EntryMetadata {
            last_successful_fetch: entry.last_fetch(),
            ..entry.metadata.clone()
        };
        entry.retag(Source::Fallback, self.config.fallback_max_age, metadata);

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(existing) if existing.get().timestamp >= entry.timestamp => false,
            Entry::Occupied(mut existing) => {
                existing.insert(entry);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    fn ttl_for(&self, source: Source) -> Duration {
        match source {
            Source::Fallback => self.config.fallback_max_age,
            Source::Fresh | Source::Cached => self.config.max_age,
        }
    }

    fn store(&self, key: &str, data: T, source: Source, metadata: EntryMetadata) -> CacheEntry<T> {
        let entry = CacheEntry::new(data, Utc::now(), source, self.ttl_for(source), metadata);
        self.entries.insert(key.to_string(), entry.clone());
        entry
    }

    /// Re-tags the stored entry as `Fallback` in place and returns it
    ///
    /// An entry past its normal expiry still qualifies while it is younger than
    /// both `max_staleness` and `fallback_max_age`.
    fn mark_rate_limited(
        &self,
        key: &str,
        message: &str,
        max_staleness: Duration,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        let fallback_ttl = self.config.fallback_max_age;
        let mut stored = self.entries.get_mut(key)?;
        let age = stored.age_at(now);
        let usable = age < fallback_ttl && (!stored.is_expired_at(now) || age < max_staleness);
        if !usable {
            return None;
        }

        let metadata = EntryMetadata {
            api_limit_exceeded: true,
            last_successful_fetch: stored.last_fetch(),
            error_message: Some(message.to_string()),
        };
        stored.retag(Source::Fallback, fallback_ttl, metadata);
        Some(stored.value().clone())
    }

    /// Relabels a sufficiently recent entry as `Cached` without persisting it
    fn stale_read(
        &self,
        key: &str,
        message: &str,
        max_staleness: Duration,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        let mut entry = {
            let stored = self.entries.get(key)?;
            if stored.age_at(now) >= max_staleness {
                return None;
            }
            stored.value().clone()
        };
        entry.source = Source::Cached;
        entry.metadata.error_message = Some(message.to_string());
        Some(entry)
    }
}
