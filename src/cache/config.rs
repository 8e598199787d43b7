//! Cache configuration
//!
//! Defaults match a production-like deployment; `CacheMode::Relaxed` keeps
//! fresh data around longer for development. Environment variables override
//! individual knobs.

use std::time::Duration;

/// Selects the default fresh-entry TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Fresh entries live for 5 minutes
    #[default]
    Standard,
    /// Fresh entries live for 30 minutes
    Relaxed,
}

impl CacheMode {
    /// Parses a mode name, accepting a few common aliases
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "production" | "prod" => Some(CacheMode::Standard),
            "relaxed" | "development" | "dev" => Some(CacheMode::Relaxed),
            _ => None,
        }
    }
}

/// Configuration for a `FreshnessCache`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for fresh and cached entries
    pub max_age: Duration,
    /// TTL for entries tagged fallback; survives long upstream outages
    pub fallback_max_age: Duration,
    /// Retry budget for callers; the cache itself makes a single attempt
    pub max_retries: u32,
    /// Pause between caller-side retries
    pub retry_delay: Duration,
    /// How often the expiry sweep runs
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::for_mode(CacheMode::Standard)
    }
}

impl CacheConfig {
    /// Defaults for the given mode
    pub fn for_mode(mode: CacheMode) -> Self {
        let max_age = match mode {
            CacheMode::Standard => Duration::from_secs(5 * 60),
            CacheMode::Relaxed => Duration::from_secs(30 * 60),
        };
        Self {
            max_age,
            fallback_max_age: Duration::from_secs(24 * 60 * 60),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }

    /// Create CacheConfig from environment variables.
    ///
    /// Environment variables:
    /// - `QUOTECACHE_MODE`: "standard" or "relaxed" (default: standard)
    /// - `QUOTECACHE_MAX_AGE_SECS`: fresh TTL override
    /// - `QUOTECACHE_FALLBACK_MAX_AGE_SECS`: fallback TTL override
    /// - `QUOTECACHE_SWEEP_INTERVAL_SECS`: sweep interval override
    ///
    /// Durations must be whole, positive seconds; anything else is ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = lookup("QUOTECACHE_MODE")
            .and_then(|s| CacheMode::from_str(&s))
            .unwrap_or_default();
        let mut config = Self::for_mode(mode);

        let secs = |name: &str| {
            lookup(name)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
        };
        if let Some(max_age) = secs("QUOTECACHE_MAX_AGE_SECS") {
            config.max_age = max_age;
        }
        if let Some(fallback_max_age) = secs("QUOTECACHE_FALLBACK_MAX_AGE_SECS") {
            config.fallback_max_age = fallback_max_age;
        }
        if let Some(sweep_interval) = secs("QUOTECACHE_SWEEP_INTERVAL_SECS") {
            config.sweep_interval = sweep_interval;
        }

        config
    }

    /// Same configuration with relaxed fresh TTL
    pub fn relaxed(mut self) -> Self {
        self.max_age = CacheConfig::for_mode(CacheMode::Relaxed).max_age;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_age, Duration::from_secs(300));
        assert_eq!(config.fallback_max_age, Duration::from_secs(86_400));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_relaxed_mode_only_changes_max_age() {
        let relaxed = CacheConfig::for_mode(CacheMode::Relaxed);
        let standard = CacheConfig::default();
        assert_eq!(relaxed.max_age, Duration::from_secs(1800));
        assert_eq!(relaxed.fallback_max_age, standard.fallback_max_age);
        assert_eq!(CacheConfig::default().relaxed(), relaxed);
    }

    #[test]
    fn test_mode_aliases() {
        assert_eq!(CacheMode::from_str("Relaxed"), Some(CacheMode::Relaxed));
        assert_eq!(CacheMode::from_str("development"), Some(CacheMode::Relaxed));
        assert_eq!(CacheMode::from_str(" prod "), Some(CacheMode::Standard));
        assert_eq!(CacheMode::from_str("bogus"), None);
    }

    #[test]
    fn test_env_overrides() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("QUOTECACHE_MODE", "relaxed"),
            ("QUOTECACHE_FALLBACK_MAX_AGE_SECS", "3600"),
            ("QUOTECACHE_SWEEP_INTERVAL_SECS", "60"),
        ]));
        assert_eq!(config.max_age, Duration::from_secs(1800));
        assert_eq!(config.fallback_max_age, Duration::from_secs(3600));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_env_garbage_falls_back_to_defaults() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("QUOTECACHE_MODE", "turbo"),
            ("QUOTECACHE_MAX_AGE_SECS", "five"),
            ("QUOTECACHE_SWEEP_INTERVAL_SECS", "0"),
        ]));
        assert_eq!(config, CacheConfig::default());
    }
}
