//! Filtering over a record set.

use crate::models::{Category, Record};

/// Conjunctive record filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub category: Option<Category>,
    /// Matches the record's region, or a mention of it in the title or summary.
    pub region: Option<String>,
    /// Case-insensitive substring over title and summary.
    pub keyword: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }

        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            let in_region = record.region.as_deref().is_some_and(|r| r.contains(region))
                || record.title.contains(region)
                || record.summary.contains(region);
            if !in_region {
                return false;
            }
        }

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            let needle = keyword.to_lowercase();
            if !record.title.to_lowercase().contains(&needle)
                && !record.summary.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }

    /// Matching records, in input order.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

pub fn find_by_id<'a>(records: &'a [Record], id: &str) -> Option<&'a Record> {
    records.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, title: &str, category: Category, region: Option<&str>) -> Record {
        let mut r = Record::fallback_stub(Utc::now());
        r.id = id.to_string();
        r.title = title.to_string();
        r.summary = "summary".to_string();
        r.category = category;
        r.region = region.map(|s| s.to_string());
        r.is_fallback = false;
        r
    }

    fn records() -> Vec<Record> {
        vec![
            record("1", "广东渔业保险补贴", Category::Funding, Some("广东")),
            record("2", "海洋牧场建设规划", Category::Policy, None),
            record("3", "Smart Aquaculture IoT", Category::Technology, Some("浙江")),
        ]
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let all = records();
        assert_eq!(RecordFilter::default().apply(&all).len(), 3);
    }

    #[test]
    fn test_category_filter() {
        let all = records();
        let filter = RecordFilter {
            category: Some(Category::Policy),
            ..Default::default()
        };
        let found = filter.apply(&all);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }

    #[test]
    fn test_region_filter_uses_field_and_text() {
        let all = records();
        let filter = RecordFilter {
            region: Some("浙江".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&all)[0].id, "3");

        let mut mentioned = records();
        mentioned[1].title = "浙江海洋牧场建设规划".to_string();
        assert_eq!(filter.apply(&mentioned).len(), 2);
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let all = records();
        let filter = RecordFilter {
            keyword: Some("iot".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&all)[0].id, "3");
    }

    #[test]
    fn test_filters_combine() {
        let all = records();
        let filter = RecordFilter {
            category: Some(Category::Funding),
            keyword: Some("海洋".to_string()),
            ..Default::default()
        };
        assert!(filter.apply(&all).is_empty());
    }

    #[test]
    fn test_find_by_id() {
        let all = records();
        assert_eq!(find_by_id(&all, "2").map(|r| r.title.as_str()), Some("海洋牧场建设规划"));
        assert!(find_by_id(&all, "missing").is_none());
    }
}
