//! Upstream failure classification
//!
//! The cache only needs to know whether a failure means "the upstream is
//! throttling us" or anything else. Error types say so through `Classify`;
//! text-only errors go through `classify_message`.

use thiserror::Error;

/// Markers that identify a rate-limit failure in an error message
const RATE_LIMIT_MARKERS: [&str; 4] = ["rate limit", "api rate limit", "429", "too many requests"];

/// How the cache should treat a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The upstream refused the request because of rate limiting
    RateLimited,
    /// Network errors, bad responses, timeouts raised by the fetcher
    Other,
}

/// Implemented by upstream error types so the cache can dispatch on kind
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;

    fn is_rate_limited(&self) -> bool {
        self.failure_kind() == FailureKind::RateLimited
    }
}

/// Classifies a failure from its message text alone
///
/// Matching is case-insensitive over the marker set.
pub fn classify_message(message: &str) -> FailureKind {
    let lowered = message.to_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        FailureKind::RateLimited
    } else {
        FailureKind::Other
    }
}

/// A text-only upstream error, classified by its message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UpstreamMessage(pub String);

impl UpstreamMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl Classify for UpstreamMessage {
    fn failure_kind(&self) -> FailureKind {
        classify_message(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_detected() {
        assert_eq!(classify_message("429 Too Many Requests"), FailureKind::RateLimited);
        assert_eq!(classify_message("rate limit reached"), FailureKind::RateLimited);
        assert_eq!(
            classify_message("Our standard API rate limit is 25 requests per day"),
            FailureKind::RateLimited
        );
        assert_eq!(classify_message("too many requests, slow down"), FailureKind::RateLimited);
    }

    #[test]
    fn test_matching_ignores_case() {
        assert_eq!(classify_message("Rate Limit exceeded"), FailureKind::RateLimited);
        assert_eq!(classify_message("TOO MANY REQUESTS"), FailureKind::RateLimited);
    }

    #[test]
    fn test_other_failures() {
        assert_eq!(classify_message("ECONNRESET"), FailureKind::Other);
        assert_eq!(classify_message("invalid JSON at line 1"), FailureKind::Other);
        assert_eq!(classify_message(""), FailureKind::Other);
    }

    #[test]
    fn test_upstream_message_uses_shim() {
        assert!(UpstreamMessage::new("HTTP 429").is_rate_limited());
        assert!(!UpstreamMessage::new("timed out").is_rate_limited());
        assert_eq!(UpstreamMessage::new("timed out").to_string(), "timed out");
    }
}
