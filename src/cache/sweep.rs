//! Background expiry sweep
//!
//! Runs `FreshnessCache::cleanup` on a fixed interval in a tokio task owned by
//! a `SweepHandle`, so the application decides when it starts and stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::freshness::FreshnessCache;

/// Handle for controlling the background sweep task
#[derive(Debug)]
pub struct SweepHandle {
    /// Signals the task to stop
    shutdown_tx: mpsc::Sender<()>,
    /// Resolves to the total number of entries removed
    task: JoinHandle<usize>,
}

impl SweepHandle {
    /// Spawns a sweep task for `cache`
    ///
    /// The first sweep happens one full `interval` after spawning. Must be
    /// called from within a tokio runtime.
    ///
    /// # Panics
    /// Panics if `interval` is zero.
    pub fn spawn<T>(cache: Arc<FreshnessCache<T>>, interval: Duration) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let task = tokio::spawn(async move {
            // Skip the first tick (immediate)
            ticker.tick().await;

            tracing::debug!(interval_secs = interval.as_secs(), "cache sweep started");

            let mut total = 0;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.cleanup();
                        total += removed;
                        if removed > 0 {
                            tracing::info!(removed, remaining = cache.len(), "swept expired cache entries");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            tracing::debug!(total_removed = total, "cache sweep stopped");
            total
        });

        Self { shutdown_tx, task }
    }

    /// Stops the sweep task and returns how many entries it removed
    ///
    /// Dropping the handle without calling this also ends the task, since the
    /// shutdown channel closes.
    pub async fn shutdown(self) -> usize {
        let _ = self.shutdown_tx.send(()).await;
        match self.task.await {
            Ok(total) => total,
            Err(err) => {
                tracing::warn!(error = %err, "cache sweep task did not finish cleanly");
                0
            }
        }
    }
}
