//! JSON file cache of collected records.
//!
//! The whole record set is rewritten with an atomic replace once per cycle.
//! The file's modification time is the snapshot's last-write time and the
//! only staleness signal.

mod merge;
mod summary;

pub use merge::{merge, prune, RetentionPolicy};
pub use summary::{summarize, CacheSummary};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Record;
use crate::utils::write_json_atomic;

/// File name of the cache inside the data directory.
pub const CACHE_FILE: &str = "policy_cache.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The persisted record set plus when it was written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<Record>,
    /// None when the cache has never been written.
    pub last_write: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_write.map(|w| now - w)
    }
}

/// Whether the snapshot's age exceeds `threshold`. Never-written snapshots are stale.
pub fn is_stale(snapshot: &Snapshot, now: DateTime<Utc>, threshold: Duration) -> bool {
    match snapshot.age(now) {
        Some(age) => age > threshold,
        None => true,
    }
}

/// File-backed record store.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Store at `<data_dir>/policy_cache.json`.
    pub fn new(data_dir: &Path) -> Self {
        Self::at(data_dir.join(CACHE_FILE))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. Any failure yields an empty snapshot.
    pub fn load(&self) -> Snapshot {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}", self.path.display());
                return Snapshot::default();
            }
            Err(e) => {
                warn!("Failed to read cache {}: {}", self.path.display(), e);
                return Snapshot::default();
            }
        };

        let records: Vec<Record> = match serde_json::from_slice(&bytes) {
            Ok(r) => r,
            Err(e) => {
                warn!("Cache {} is malformed, ignoring it: {}", self.path.display(), e);
                return Snapshot::default();
            }
        };

        Snapshot {
            records: collapse_duplicate_ids(records),
            last_write: self.modified_at(),
        }
    }

    /// Replace the cache with `records`. Fallback stubs are never written.
    pub fn save(&self, records: &[Record]) -> Result<Snapshot, StoreError> {
        let records: Vec<Record> = records.iter().filter(|r| !r.is_fallback).cloned().collect();

        write_json_atomic(&self.path, &records).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!("Saved {} records to {}", records.len(), self.path.display());

        Ok(Snapshot {
            records,
            last_write: Some(self.modified_at().unwrap_or_else(Utc::now)),
        })
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }
}

/// Keep one record per id, last occurrence wins, first position kept.
fn collapse_duplicate_ids(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        match seen.get(&record.id) {
            Some(&pos) => out[pos] = record,
            None => {
                seen.insert(record.id.clone(), out.len());
                out.push(record);
            }
        }
    }
    out
}
