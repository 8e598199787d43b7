//! Market quote API client
//!
//! Fetches quotes from a GLOBAL_QUOTE-style provider and maps them into `Quote`.
//! Providers of this kind signal throttling two ways: HTTP 429, or an HTTP 200
//! whose body carries a note instead of data. Both become
//! `QuoteError::RateLimited` so the cache serves fallback data.

use std::future::Future;

use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::Quote;
use crate::cache::{classify_message, Classify, FailureKind};

/// Base URL for the quote provider
const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Key used when no API key is configured; the provider throttles it heavily
const DEMO_API_KEY: &str = "demo";

/// Errors that can occur when fetching a quote
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The provider refused the request because of rate limiting
    #[error("API rate limit exceeded: {0}")]
    RateLimited(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// A field in the response had an unexpected value
    #[error("Invalid field in response: {0}")]
    Parse(String),

    /// Provider rejected the request for a reason other than rate limiting
    #[error("Provider rejected request: {0}")]
    Rejected(String),

    /// Provider has no quote for the symbol
    #[error("No quote found for symbol: {0}")]
    NotFound(String),

    /// Symbol was empty after normalization
    #[error("Invalid symbol: '{0}'")]
    InvalidSymbol(String),
}

impl Classify for QuoteError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            QuoteError::RateLimited(_) => FailureKind::RateLimited,
            QuoteError::Status(code) if *code == StatusCode::TOO_MANY_REQUESTS.as_u16() => {
                FailureKind::RateLimited
            }
            QuoteError::Http(err) if err.status() == Some(StatusCode::TOO_MANY_REQUESTS) => {
                FailureKind::RateLimited
            }
            _ => FailureKind::Other,
        }
    }
}

impl QuoteError {
    /// Whether asking again could plausibly succeed
    ///
    /// Transport failures, server errors, and malformed bodies are transient.
    /// Rate limits, rejections, and unknown or invalid symbols are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            QuoteError::Http(err) => err.status().map_or(true, |status| status.is_server_error()),
            QuoteError::Status(code) => *code >= 500,
            QuoteError::Json(_) | QuoteError::Parse(_) => true,
            QuoteError::RateLimited(_)
            | QuoteError::Rejected(_)
            | QuoteError::NotFound(_)
            | QuoteError::InvalidSymbol(_) => false,
        }
    }
}

/// Anything that can produce a quote for a symbol
pub trait QuoteSource: Send + Sync {
    fn fetch_quote(&self, symbol: &str) -> impl Future<Output = Result<Quote, QuoteError>> + Send;
}

/// Client for fetching quotes over HTTP
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl QuoteClient {
    /// Create a new QuoteClient for the default provider
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Create a QuoteClient from environment variables.
    ///
    /// Environment variables:
    /// - `QUOTECACHE_API_KEY`: provider API key (default: "demo")
    /// - `QUOTECACHE_BASE_URL`: provider endpoint override
    pub fn from_env() -> Self {
        let api_key = std::env::var("QUOTECACHE_API_KEY").unwrap_or_else(|_| DEMO_API_KEY.to_string());
        let client = Self::new(api_key);
        match std::env::var("QUOTECACHE_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        }
    }

    /// Use a different provider endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a custom HTTP client (e.g. with a timeout configured)
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Fetch the latest quote for a symbol
    ///
    /// # Returns
    /// * `Ok(Quote)` - the quote
    /// * `Err(QuoteError::RateLimited)` - on HTTP 429 or a throttling note
    /// * `Err(QuoteError)` - if the request or parsing fails
    pub async fn fetch(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(QuoteError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        parse_global_quote(&text, symbol)
    }
}

impl QuoteSource for QuoteClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        self.fetch(symbol).await
    }
}

/// Top-level provider response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<RawQuote>,
    /// Sent instead of data when the call frequency is exceeded
    #[serde(rename = "Note")]
    note: Option<String>,
    /// Sent for daily limits and for key problems
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

/// Quote fields as sent by the provider, all strings
#[derive(Debug, Default, Deserialize)]
struct RawQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "02. open")]
    open: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

/// Parse a provider response body into a Quote
fn parse_global_quote(body: &str, requested: &str) -> Result<Quote, QuoteError> {
    let response: GlobalQuoteResponse = serde_json::from_str(body)?;

    if let Some(note) = response.note {
        return Err(QuoteError::RateLimited(note));
    }
    if let Some(information) = response.information {
        return Err(match classify_message(&information) {
            FailureKind::RateLimited => QuoteError::RateLimited(information),
            FailureKind::Other => QuoteError::Rejected(information),
        });
    }
    if let Some(message) = response.error_message {
        return Err(QuoteError::Rejected(message));
    }

    let raw = match response.global_quote {
        Some(raw) if raw.price.is_some() => raw,
        _ => return Err(QuoteError::NotFound(requested.to_string())),
    };

    let trading_day = required("latest trading day", raw.latest_trading_day)?;
    let latest_trading_day = NaiveDate::parse_from_str(&trading_day, "%Y-%m-%d")
        .map_err(|e| QuoteError::Parse(format!("latest trading day '{}': {}", trading_day, e)))?;

    let volume_text = required("volume", raw.volume)?;
    let volume = volume_text
        .trim()
        .parse::<u64>()
        .map_err(|_| QuoteError::Parse(format!("volume '{}'", volume_text)))?;

    Ok(Quote {
        symbol: raw.symbol.unwrap_or_else(|| requested.to_string()).to_uppercase(),
        price: number("price", raw.price)?,
        open: number("open", raw.open)?,
        high: number("high", raw.high)?,
        low: number("low", raw.low)?,
        previous_close: number("previous close", raw.previous_close)?,
        change: number("change", raw.change)?,
        change_percent: number("change percent", raw.change_percent)?,
        volume,
        latest_trading_day,
        fetched_at: Utc::now(),
    })
}

fn required(field: &str, value: Option<String>) -> Result<String, QuoteError> {
    value.ok_or_else(|| QuoteError::Parse(format!("missing {}", field)))
}

/// Parse a decimal field, tolerating a trailing percent sign
fn number(field: &str, value: Option<String>) -> Result<f64, QuoteError> {
    let text = required(field, value)?;
    text.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| QuoteError::Parse(format!("{} '{}'", field, text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_QUOTE: &str = r#"{
        "Global Quote": {
            "01. symbol": "IBM",
            "02. open": "219.5000",
            "03. high": "221.1000",
            "04. low": "218.0500",
            "05. price": "220.7200",
            "06. volume": "3518713",
            "07. latest trading day": "2026-10-14",
            "08. previous close": "219.0100",
            "09. change": "1.7100",
            "10. change percent": "0.7808%"
        }
    }"#;

    #[test]
    fn test_parse_valid_quote() {
        let quote = parse_global_quote(SAMPLE_QUOTE, "ibm").expect("Should parse quote");

        assert_eq!(quote.symbol, "IBM");
        assert!((quote.price - 220.72).abs() < 0.0001);
        assert!((quote.open - 219.5).abs() < 0.0001);
        assert!((quote.previous_close - 219.01).abs() < 0.0001);
        assert!((quote.change_percent - 0.7808).abs() < 0.0001);
        assert_eq!(quote.volume, 3_518_713);
        assert_eq!(
            quote.latest_trading_day,
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
        );
    }

    #[test]
    fn test_frequency_note_is_rate_limited() {
        let body = r#"{"Note": "Thank you for using our API! Our standard API call frequency is 5 calls per minute."}"#;
        let err = parse_global_quote(body, "IBM").unwrap_err();

        assert!(matches!(err, QuoteError::RateLimited(_)));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_daily_limit_information_is_rate_limited() {
        let body = r#"{"Information": "Our standard API rate limit is 25 requests per day."}"#;
        let err = parse_global_quote(body, "IBM").unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_other_information_is_rejected() {
        let body = r#"{"Information": "The **demo** API key is for demo purposes only."}"#;
        let err = parse_global_quote(body, "IBM").unwrap_err();

        assert!(matches!(err, QuoteError::Rejected(_)));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_empty_quote_is_not_found() {
        let err = parse_global_quote(r#"{"Global Quote": {}}"#, "ZZZZ").unwrap_err();
        assert!(matches!(err, QuoteError::NotFound(ref s) if s == "ZZZZ"));
    }

    #[test]
    fn test_bad_number_is_parse_error() {
        let body = SAMPLE_QUOTE.replace("220.7200", "n/a");
        let err = parse_global_quote(&body, "IBM").unwrap_err();
        assert!(matches!(err, QuoteError::Parse(_)));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_global_quote("<html>", "IBM").unwrap_err();
        assert!(matches!(err, QuoteError::Json(_)));
    }

    #[test]
    fn test_status_classification() {
        assert!(QuoteError::Status(429).is_rate_limited());
        assert!(!QuoteError::Status(503).is_rate_limited());
        // Numbers inside other errors must not trip the marker shim
        assert!(!QuoteError::Parse("price '429.50'".to_string()).is_rate_limited());
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(QuoteError::Status(502).is_retryable());
        assert!(QuoteError::Parse("price 'n/a'".to_string()).is_retryable());
        assert!(!QuoteError::Status(404).is_retryable());
        assert!(!QuoteError::Status(429).is_retryable());
        assert!(!QuoteError::RateLimited("Note".to_string()).is_retryable());
        assert!(!QuoteError::NotFound("ZZZZ".to_string()).is_retryable());
        assert!(!QuoteError::Rejected("invalid API key".to_string()).is_retryable());
        assert!(!QuoteError::InvalidSymbol(String::new()).is_retryable());
    }

    #[test]
    fn test_with_base_url() {
        let client = QuoteClient::new("key").with_base_url("http://localhost:9999/query");
        assert_eq!(client.base_url, "http://localhost:9999/query");
        assert_eq!(client.api_key, "key");
    }
}
