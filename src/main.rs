//! quotecache - Look up stock quotes with graceful degradation
//!
//! Prints one line per symbol. When the provider throttles or fails, the last
//! known quote is shown with a badge saying how old it is and why.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quotecache::cache::{CacheConfig, FreshnessCache, SnapshotStore, SweepHandle};
use quotecache::cli::{Cli, StartupConfig};
use quotecache::quote::{Quote, QuoteClient, QuoteService, QuoteSource};
use quotecache::report;

/// Snapshot file name for quote entries
const SNAPSHOT_NAME: &str = "quotes";

/// Sets up logging to stderr, filtered by `RUST_LOG` (default: quotecache=info)
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quotecache=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Looks up every symbol once and prints the results
///
/// Returns `true` if every symbol produced data.
async fn run_round<S: QuoteSource>(
    service: &QuoteService<S>,
    cache: &FreshnessCache<Quote>,
    startup: &StartupConfig,
) -> bool {
    let results = service.lookup_many(&startup.symbols).await;

    let mut all_ok = true;
    for (symbol, result) in &results {
        match result {
            Ok(entry) => println!("{}", report::render_quote(entry)),
            Err(err) => {
                all_ok = false;
                println!("{}", report::render_failure(symbol, err));
            }
        }
    }

    if startup.show_stats {
        println!("{}", report::render_stats(&cache.stats()));
    }

    all_ok
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli, CacheConfig::from_env()) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    let cache = Arc::new(FreshnessCache::new(startup.cache.clone()));

    let snapshots = if startup.snapshot { SnapshotStore::new() } else { None };
    if let Some(store) = &snapshots {
        let restored = store.load_into(SNAPSHOT_NAME, &cache);
        tracing::info!(restored, "restored quotes from snapshot");
    }

    let sweeper = SweepHandle::spawn(cache.clone(), startup.cache.sweep_interval);
    let service = QuoteService::new(QuoteClient::from_env(), cache.clone());

    let mut all_ok;
    loop {
        all_ok = run_round(&service, &cache, &startup).await;

        let Some(every) = startup.watch else {
            break;
        };
        tokio::select! {
            _ = tokio::time::sleep(every) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        println!();
    }

    let swept = sweeper.shutdown().await;
    tracing::debug!(swept, "cache sweep finished");

    if let Some(store) = &snapshots {
        if let Err(err) = store.save(SNAPSHOT_NAME, &cache) {
            tracing::warn!(error = %err, "failed to save quote snapshot");
        }
    }

    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
