//! Quote lookups through the freshness cache
//!
//! `QuoteService` is the caller of `FreshnessCache::get_with_fallback` for
//! stock quotes: it builds the cache key, retries outright failures, and looks
//! up batches concurrently.

use std::sync::Arc;

use super::{Quote, QuoteError, QuoteSource};
use crate::cache::{normalize_identifier, quote_key, CacheEntry, FallbackOptions, FreshnessCache};

/// Looks up quotes from a source, degrading to cached data on failure
#[derive(Debug)]
pub struct QuoteService<S> {
    source: S,
    cache: Arc<FreshnessCache<Quote>>,
}

impl<S: QuoteSource> QuoteService<S> {
    pub fn new(source: S, cache: Arc<FreshnessCache<Quote>>) -> Self {
        Self { source, cache }
    }

    /// The shared cache backing this service
    pub fn cache(&self) -> &Arc<FreshnessCache<Quote>> {
        &self.cache
    }

    /// Looks up one symbol
    ///
    /// # Returns
    /// * `Ok(CacheEntry<Quote>)` - fresh data, or degraded data tagged with its source
    /// * `Err(QuoteError)` - the last upstream error when no data exists at all
    ///
    /// # Behavior
    /// Transient failures that leave no data are retried up to `max_retries`
    /// times, `retry_delay` apart. Rate limits, rejections, and unknown symbols
    /// are returned after the first attempt.
    pub async fn lookup(&self, symbol: &str) -> Result<CacheEntry<Quote>, QuoteError> {
        let requested = symbol;
        let symbol = normalize_identifier(requested);
        if symbol.is_empty() {
            return Err(QuoteError::InvalidSymbol(requested.to_string()));
        }
        let key = quote_key(&symbol);
        let config = self.cache.config();

        let mut attempt = 0;
        loop {
            let result = self
                .cache
                .get_with_fallback(&key, || self.source.fetch_quote(&symbol), FallbackOptions::new())
                .await;

            match result {
                Err(err) if err.is_retryable() && attempt < config.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        symbol = %symbol,
                        attempt,
                        max_retries = config.max_retries,
                        error = %err,
                        "retrying quote lookup"
                    );
                    tokio::time::sleep(config.retry_delay).await;
                }
                other => return other,
            }
        }
    }

    /// Looks up several symbols concurrently
    ///
    /// One result per input symbol, in input order; a failure for one symbol
    /// never affects the others.
    pub async fn lookup_many(
        &self,
        symbols: &[String],
    ) -> Vec<(String, Result<CacheEntry<Quote>, QuoteError>)> {
        let lookups = symbols.iter().map(|symbol| self.lookup(symbol));
        let results = futures::future::join_all(lookups).await;

        symbols.iter().cloned().zip(results).collect()
    }
}
