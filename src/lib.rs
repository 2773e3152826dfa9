//! policyscout - resilient collection of fishery and agriculture policy records.
//!
//! Crawls a table of web sources for a keyword list, normalizes the results
//! into records, and keeps them in a merge-on-id JSON cache. Each domain sits
//! behind a circuit breaker, and a fallback cascade (primary crawl, secondary
//! search, last good cache, static stub) guarantees a non-empty answer.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod scrapers;
pub mod services;
pub mod sources;
pub mod utils;
