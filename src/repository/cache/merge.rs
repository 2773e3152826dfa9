//! Id-keyed merge and category-aware retention.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::Record;
use crate::services::categorize::mentions_policy_or_funding;

/// Retention horizons in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub default_days: i64,
    /// Horizon for policy and funding content.
    pub extended_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            default_days: 30,
            extended_days: 60,
        }
    }
}

impl RetentionPolicy {
    pub fn horizon_days(&self, record: &Record) -> i64 {
        if record.category.has_extended_retention() || mentions_policy_or_funding(&record.title) {
            self.extended_days
        } else {
            self.default_days
        }
    }
}

/// Merge `new` into `old` by id. New records win; existing positions are
/// kept and unseen records are appended in their batch order.
pub fn merge(old: &[Record], new: &[Record]) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::with_capacity(old.len() + new.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(old.len() + new.len());

    for record in old.iter().chain(new.iter()) {
        match index.get(&record.id) {
            Some(&pos) => merged[pos] = record.clone(),
            None => {
                index.insert(record.id.clone(), merged.len());
                merged.push(record.clone());
            }
        }
    }
    merged
}

/// Drop records published before their retention horizon.
pub fn prune(records: Vec<Record>, now: DateTime<Utc>, policy: &RetentionPolicy) -> Vec<Record> {
    let today = now.date_naive();
    records
        .into_iter()
        .filter(|r| r.publish_date >= today - Duration::days(policy.horizon_days(r)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    fn record(id: &str, title: &str, category: Category, date: NaiveDate) -> Record {
        let mut r = Record::fallback_stub(Utc::now());
        r.id = id.to_string();
        r.title = title.to_string();
        r.category = category;
        r.publish_date = date;
        r.is_fallback = false;
        r
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-30T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn days_ago(days: i64) -> NaiveDate {
        now().date_naive() - Duration::days(days)
    }

    #[test]
    fn test_merge_new_wins_and_keeps_order() {
        let old = vec![
            record("a", "old a", Category::Other, days_ago(1)),
            record("b", "old b", Category::Other, days_ago(1)),
        ];
        let new = vec![
            record("c", "new c", Category::Other, days_ago(0)),
            record("a", "new a", Category::Other, days_ago(0)),
        ];
        let merged = merge(&old, &new);
        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged[0].title, "new a");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let old = vec![record("a", "a", Category::Other, days_ago(1))];
        let new = vec![
            record("a", "a2", Category::Other, days_ago(0)),
            record("b", "b", Category::Other, days_ago(0)),
        ];
        let once = merge(&old, &new);
        let twice = merge(&once, &new);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_collapses_duplicate_ids_in_batch() {
        let new = vec![
            record("a", "first", Category::Other, days_ago(0)),
            record("a", "second", Category::Other, days_ago(0)),
        ];
        let merged = merge(&[], &new);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "second");
    }

    #[test]
    fn test_prune_default_and_extended_horizons() {
        let policy = RetentionPolicy::default();
        let records = vec![
            record("fresh", "锦鲤展会", Category::Other, days_ago(10)),
            record("old-other", "锦鲤展会", Category::Technology, days_ago(45)),
            record("old-policy", "锦鲤展会", Category::Policy, days_ago(45)),
            record("old-title", "渔业补贴发放", Category::Other, days_ago(45)),
            record("ancient-policy", "规划", Category::Policy, days_ago(61)),
            record("edge", "锦鲤展会", Category::Other, days_ago(30)),
        ];
        let kept: Vec<String> = prune(records, now(), &policy)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(kept, vec!["fresh", "old-policy", "old-title", "edge"]);
    }
}
