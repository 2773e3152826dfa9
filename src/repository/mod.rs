//! Persistence layer.
//!
//! Records live in a single JSON file per data directory; see [`cache`].

pub mod cache;

pub use cache::{
    is_stale, merge, prune, summarize, CacheStore, CacheSummary, RetentionPolicy, Snapshot,
    StoreError, CACHE_FILE,
};
