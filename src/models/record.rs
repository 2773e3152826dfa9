//! Policy record model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Derived topic tag for a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Policy,
    Funding,
    Technology,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Funding => "funding",
            Self::Technology => "technology",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "policy" => Some(Self::Policy),
            "funding" => Some(Self::Funding),
            "technology" | "tech" => Some(Self::Technology),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Categories that receive the extended retention window.
    pub fn has_extended_retention(&self) -> bool {
        matches!(self, Self::Policy | Self::Funding)
    }

    pub fn all() -> [Category; 4] {
        [Self::Policy, Self::Funding, Self::Technology, Self::Other]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single collected document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier derived from (domain, url). Merge key.
    pub id: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    /// Host of the source that produced this record.
    pub source_domain: String,
    /// Best-effort publication date, defaults to the crawl date.
    pub publish_date: NaiveDate,
    /// Query term that produced the record.
    pub keyword: String,
    pub category: Category,
    pub crawled_at: DateTime<Utc>,
    /// Province or region of the source, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// True only for the synthetic placeholder served when nothing else is available.
    #[serde(default)]
    pub is_fallback: bool,
}

impl Record {
    /// Compute the record id for a (domain, url) pair.
    ///
    /// Without a url the id gets a random suffix, so such records never merge.
    pub fn compute_id(domain: &str, url: Option<&str>) -> String {
        match url {
            Some(url) if !url.is_empty() => {
                let mut hasher = Sha256::new();
                hasher.update(domain.as_bytes());
                hasher.update(b"|");
                hasher.update(url.as_bytes());
                let digest = hex::encode(hasher.finalize());
                digest[..16].to_string()
            }
            _ => format!("{}-{}", domain, uuid::Uuid::new_v4().simple()),
        }
    }

    /// The hardcoded placeholder returned when every acquisition stage came up empty.
    pub fn fallback_stub(now: DateTime<Utc>) -> Self {
        Self {
            id: "fallback-stub".to_string(),
            title: "政策数据暂时无法获取".to_string(),
            summary: "所有数据源暂时不可用，且本地缓存为空。此条为占位记录，请稍后重试。"
                .to_string(),
            url: "https://www.moa.gov.cn/".to_string(),
            source_domain: "moa.gov.cn".to_string(),
            publish_date: now.date_naive(),
            keyword: String::new(),
            category: Category::Other,
            crawled_at: now,
            region: None,
            is_fallback: true,
        }
    }
}
