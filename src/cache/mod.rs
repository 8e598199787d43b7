//! Freshness-tracking cache for unreliable upstream data
//!
//! This module provides an in-memory cache whose entries carry their
//! provenance (fresh, cached, fallback). On upstream failure it degrades to
//! stored data instead of failing, annotating the result so callers can show
//! the right trust indicator. A background sweep removes expired entries and
//! snapshots let last-known data survive a restart.

mod classify;
mod config;
mod entry;
mod freshness;
mod keys;
mod snapshot;
mod sweep;

pub use classify::{classify_message, Classify, FailureKind, UpstreamMessage};
pub use config::{CacheConfig, CacheMode};
pub use entry::{format_age, CacheEntry, EntryMetadata, Source};
pub use freshness::{CacheStats, FallbackOptions, FreshnessCache, DEFAULT_MAX_STALENESS};
pub use keys::{cache_key, normalize_identifier, quote_key, STOCK_QUOTE_ENTITY};
pub use snapshot::{SnapshotError, SnapshotStore};
pub use sweep::SweepHandle;
