//! Plain-text rendering of lookup results
//!
//! Every quote line ends with a provenance badge so degraded data is never
//! shown as if it were live.

use crate::cache::{CacheEntry, CacheStats, Source};
use crate::quote::{Quote, QuoteError};

/// Short trust indicator for an entry, e.g. "CACHED 12m ago"
pub fn badge<T>(entry: &CacheEntry<T>) -> String {
    match entry.source {
        Source::Fresh => "LIVE".to_string(),
        Source::Cached => format!("CACHED {}", entry.describe_age()),
        Source::Fallback => format!("RATE LIMITED {}", entry.describe_age()),
    }
}

/// One line for a successful lookup
pub fn render_quote(entry: &CacheEntry<Quote>) -> String {
    let quote = &entry.data;
    format!(
        "{:<8} {:>10.2} {:>+9.2} ({:>+6.2}%)  [{}]",
        quote.symbol,
        quote.price,
        quote.change,
        quote.change_percent,
        badge(entry)
    )
}

/// One line for a lookup that produced no data
pub fn render_failure(symbol: &str, err: &QuoteError) -> String {
    format!("{:<8} unavailable: {}", symbol, err)
}

/// Summary line for cache statistics
pub fn render_stats(stats: &CacheStats) -> String {
    format!(
        "cache: {} entries ({} fresh, {} cached, {} fallback, {} expired)",
        stats.total_entries,
        stats.fresh_entries,
        stats.cached_entries,
        stats.fallback_entries,
        stats.expired_entries
    )
}
