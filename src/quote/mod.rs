//! Stock quote data and retrieval
//!
//! This module contains the quote model, the upstream provider client, and
//! the service that routes lookups through the freshness cache.

pub mod client;
pub mod service;

pub use client::{QuoteClient, QuoteError, QuoteSource};
pub use service::QuoteService;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time stock quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol, uppercase
    pub symbol: String,
    /// Latest traded price
    pub price: f64,
    /// Opening price of the latest session
    pub open: f64,
    /// Session high
    pub high: f64,
    /// Session low
    pub low: f64,
    /// Close of the previous session
    pub previous_close: f64,
    /// Absolute change against the previous close
    pub change: f64,
    /// Percent change against the previous close
    pub change_percent: f64,
    /// Shares traded in the latest session
    pub volume: u64,
    /// Date of the session the quote belongs to
    pub latest_trading_day: NaiveDate,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    /// Whether the price is up against the previous close
    pub fn is_up(&self) -> bool {
        self.change > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(change: f64) -> Quote {
        Quote {
            symbol: "AAPL".to_string(),
            price: 150.0 + change,
            open: 149.0,
            high: 152.0,
            low: 148.5,
            previous_close: 150.0,
            change,
            change_percent: change / 1.5,
            volume: 1_000_000,
            latest_trading_day: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_up() {
        assert!(quote(1.25).is_up());
        assert!(!quote(0.0).is_up());
        assert!(!quote(-3.0).is_up());
    }

    #[test]
    fn test_quote_serializes_trading_day_as_date() {
        let json = serde_json::to_string(&quote(1.0)).expect("Failed to serialize Quote");
        assert!(json.contains("\"latest_trading_day\":\"2026-10-14\""));
    }
}
