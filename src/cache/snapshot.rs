//! Disk snapshots of cache contents
//!
//! Persists the last-known entries of a `FreshnessCache` to a JSON file so a
//! restarted process still has something to show while the upstream is
//! throttling. Restored entries come back tagged `Fallback`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use super::entry::CacheEntry;
use super::freshness::FreshnessCache;

/// Errors that can occur when writing a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Directory creation or file write failed
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Entries could not be serialized
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk layout of a snapshot file
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile<T> {
    /// When the snapshot was written
    saved_at: DateTime<Utc>,
    /// Live entries at save time, keyed by cache key
    entries: HashMap<String, CacheEntry<T>>,
}

/// Reads and writes cache snapshots in a directory
///
/// Uses `~/.cache/quotecache/` on Linux (or the platform equivalent) unless a
/// directory is given explicitly.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Directory where snapshot files are stored
    dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a SnapshotStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "quotecache")?;
        Some(Self {
            dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    /// Creates a SnapshotStore with a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Writes every live entry of `cache` under `name`
    ///
    /// # Returns
    /// * `Ok(count)` - number of entries written
    /// * `Err(SnapshotError)` - if serialization or the write fails
    pub fn save<T>(&self, name: &str, cache: &FreshnessCache<T>) -> Result<usize, SnapshotError>
    where
        T: Clone + Serialize,
    {
        fs::create_dir_all(&self.dir)?;

        let entries: HashMap<String, CacheEntry<T>> = cache.export().into_iter().collect();
        let count = entries.len();
        let file = SnapshotFile {
            saved_at: Utc::now(),
            entries,
        };

        let json = serde_json::to_string_pretty(&file)?;
        fs::write(self.snapshot_path(name), json)?;

        tracing::debug!(name, count, "saved cache snapshot");
        Ok(count)
    }

    /// Restores entries saved under `name` into `cache`
    ///
    /// Returns the number of entries restored. A missing or unreadable
    /// snapshot restores nothing.
    pub fn load_into<T>(&self, name: &str, cache: &FreshnessCache<T>) -> usize
    where
        T: Clone + DeserializeOwned,
    {
        let Some(file) = self.read::<T>(name) else {
            return 0;
        };

        let restored = file
            .entries
            .into_iter()
            .map(|(key, entry)| cache.restore(&key, entry))
            .filter(|restored| *restored)
            .count();

        tracing::debug!(name, restored, saved_at = %file.saved_at, "loaded cache snapshot");
        restored
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Option<SnapshotFile<T>> {
        let content = fs::read_to_string(self.snapshot_path(name)).ok()?;
        match serde_json::from_str(&content) {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(name, error = %err, "ignoring unreadable cache snapshot");
                None
            }
        }
    }
}
