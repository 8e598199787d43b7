//! Cache key naming
//!
//! Keys are `"<entity>_<identifier>"` with the identifier normalized so that
//! `" aapl"` and `"AAPL"` land on the same entry.

/// Entity prefix for stock quote entries
pub const STOCK_QUOTE_ENTITY: &str = "stock_quote";

/// Trims, uppercases, and joins internal whitespace with underscores
pub fn normalize_identifier(identifier: &str) -> String {
    identifier
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Builds a cache key for an entity and identifier
pub fn cache_key(entity: &str, identifier: &str) -> String {
    format!("{}_{}", entity, normalize_identifier(identifier))
}

/// Cache key for a stock quote, e.g. `stock_quote_AAPL`
pub fn quote_key(symbol: &str) -> String {
    cache_key(STOCK_QUOTE_ENTITY, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_key_format() {
        assert_eq!(quote_key("AAPL"), "stock_quote_AAPL");
    }

    #[test]
    fn test_quote_key_normalizes_symbol() {
        assert_eq!(quote_key("  aapl "), "stock_quote_AAPL");
        assert_eq!(quote_key("brk.b"), "stock_quote_BRK.B");
    }

    #[test]
    fn test_internal_whitespace_collapsed() {
        assert_eq!(cache_key("index", "s&p   500"), "index_S&P_500");
    }
}
