//! Integration tests for CLI argument handling
//!
//! Only argument errors and help are exercised here; anything that would
//! reach the network is covered by unit tests with scripted sources.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_quotecache"))
        .args(args)
        .env("QUOTECACHE_BASE_URL", "http://127.0.0.1:9/query")
        .output()
        .expect("Failed to execute quotecache")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("quotecache"), "Help should mention quotecache");
    assert!(stdout.contains("--relaxed"), "Help should mention --relaxed flag");
    assert!(stdout.contains("--watch"), "Help should mention --watch flag");
}

#[test]
fn test_missing_symbols_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success(), "Expected missing symbols to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SYMBOL"), "Should explain the missing argument: {}", stderr);
}

#[test]
fn test_invalid_symbol_prints_error_and_exits() {
    let output = run_cli(&["--no-snapshot", "AA$PL"]);
    assert_eq!(output.status.code(), Some(2), "Expected invalid symbol to exit with 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid symbol"),
        "Should print error message about invalid symbol: {}",
        stderr
    );
}

#[test]
fn test_zero_watch_interval_rejected() {
    let output = run_cli(&["--no-snapshot", "--watch", "0", "AAPL"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Watch interval"), "Unexpected stderr: {}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use quotecache::cache::CacheConfig;
    use quotecache::cli::{parse_symbol_arg, Cli, StartupConfig};

    #[test]
    fn test_cli_symbols_collected_in_order() {
        let cli = Cli::parse_from(["quotecache", "msft", "AAPL"]);
        let config = StartupConfig::from_cli(&cli, CacheConfig::default()).unwrap();
        assert_eq!(config.symbols, vec!["MSFT", "AAPL"]);
    }

    #[test]
    fn test_parse_symbol_arg_accepts_index_symbols() {
        assert_eq!(parse_symbol_arg("^dji").unwrap(), "^DJI");
    }

    #[test]
    fn test_relaxed_keeps_env_overrides() {
        let base = CacheConfig {
            fallback_max_age: std::time::Duration::from_secs(60),
            ..CacheConfig::default()
        };
        let cli = Cli::parse_from(["quotecache", "--relaxed", "AAPL"]);
        let config = StartupConfig::from_cli(&cli, base).unwrap();
        assert_eq!(config.cache.fallback_max_age, std::time::Duration::from_secs(60));
        assert_eq!(config.cache.max_age, std::time::Duration::from_secs(1800));
    }
}
