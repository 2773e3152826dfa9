//! Per-category and per-keyword counts over a snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Snapshot;
use crate::models::Category;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheSummary {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_keyword: BTreeMap<String, usize>,
}

/// Count records per category (all categories present, zero included) and per keyword.
pub fn summarize(snapshot: &Snapshot) -> CacheSummary {
    let mut by_category: BTreeMap<String, usize> = Category::all()
        .iter()
        .map(|c| (c.as_str().to_string(), 0))
        .collect();
    let mut by_keyword = BTreeMap::new();

    for record in &snapshot.records {
        *by_category
            .entry(record.category.as_str().to_string())
            .or_insert(0) += 1;
        if !record.keyword.is_empty() {
            *by_keyword.entry(record.keyword.clone()).or_insert(0) += 1;
        }
    }

    CacheSummary {
        total: snapshot.records.len(),
        by_category,
        by_keyword,
    }
}
