//! Command-line interface parsing for quotecache
//!
//! This module handles parsing of CLI arguments using clap and layers them on
//! top of the environment-derived cache configuration.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::{normalize_identifier, CacheConfig};

/// Longest ticker symbol accepted
const MAX_SYMBOL_LEN: usize = 12;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The symbol contains characters no exchange uses
    #[error("Invalid symbol: '{0}'. Symbols are 1-12 letters, digits, '.', '-', '^' or '='")]
    InvalidSymbol(String),

    /// Watch mode needs a positive interval
    #[error("Watch interval must be at least 1 second")]
    ZeroWatchInterval,
}

/// quotecache - Stock quotes that degrade gracefully under rate limits
#[derive(Parser, Debug)]
#[command(name = "quotecache")]
#[command(about = "Look up stock quotes, falling back to cached data when the provider throttles")]
#[command(version)]
pub struct Cli {
    /// Ticker symbols to look up
    ///
    /// Examples:
    ///   quotecache AAPL MSFT
    ///   quotecache --watch 60 brk.b
    #[arg(required = true, value_name = "SYMBOL")]
    pub symbols: Vec<String>,

    /// Keep fresh quotes for 30 minutes instead of 5
    #[arg(long)]
    pub relaxed: bool,

    /// Repeat the lookup every SECS seconds until interrupted
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Do not load or save the on-disk snapshot of last-known quotes
    #[arg(long)]
    pub no_snapshot: bool,

    /// Print cache statistics after each round
    #[arg(long)]
    pub stats: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Normalized symbols, duplicates removed, input order kept
    pub symbols: Vec<String>,
    /// Cache configuration with CLI overrides applied
    pub cache: CacheConfig,
    /// Interval between lookups in watch mode
    pub watch: Option<Duration>,
    /// Whether to load and save the snapshot
    pub snapshot: bool,
    /// Whether to print cache statistics
    pub show_stats: bool,
}

/// Parses and normalizes a symbol argument.
///
/// # Returns
/// * `Ok(String)` with the normalized symbol
/// * `Err(CliError::InvalidSymbol)` if the symbol is empty, too long, or has bad characters
pub fn parse_symbol_arg(s: &str) -> Result<String, CliError> {
    let symbol = normalize_identifier(s);
    let valid_chars = symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN || !valid_chars {
        return Err(CliError::InvalidSymbol(s.to_string()));
    }
    Ok(symbol)
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    /// * `base` - Cache configuration before CLI overrides (usually from the environment)
    pub fn from_cli(cli: &Cli, base: CacheConfig) -> Result<Self, CliError> {
        let mut symbols: Vec<String> = Vec::with_capacity(cli.symbols.len());
        for arg in &cli.symbols {
            let symbol = parse_symbol_arg(arg)?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }

        let watch = match cli.watch {
            None => None,
            Some(0) => return Err(CliError::ZeroWatchInterval),
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let cache = if cli.relaxed { base.relaxed() } else { base };

        Ok(StartupConfig {
            symbols,
            cache,
            watch,
            snapshot: !cli.no_snapshot,
            show_stats: cli.stats,
        })
    }
}
