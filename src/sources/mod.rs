//! Source table: per-domain URL templates and extraction rules.
//!
//! Each crawled domain is described by data rather than code, so adding a
//! source is a config change. The table is looked up once per crawl cycle.

mod defaults;

pub use defaults::{default_keywords, default_sources};

use serde::{Deserialize, Serialize};

/// Trust tier of a source. Lower tiers are scheduled first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// Government sites.
    Official,
    /// Established news media.
    Media,
    /// Trade and industry sites.
    #[default]
    Industry,
}

impl SourceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Media => "media",
            Self::Industry => "industry",
        }
    }
}

/// CSS selectors used to pull candidate records out of a results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Selector for one candidate (a list item, a result card).
    #[serde(default = "default_item_selector")]
    pub item_selector: String,
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
    #[serde(default = "default_date_selector")]
    pub date_selector: String,
    #[serde(default = "default_summary_selector")]
    pub summary_selector: String,
}

fn default_item_selector() -> String {
    "li".to_string()
}

fn default_title_selector() -> String {
    "h3, h2, a".to_string()
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_date_selector() -> String {
    ".date, .time, span".to_string()
}

fn default_summary_selector() -> String {
    "p, .summary".to_string()
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            item_selector: default_item_selector(),
            title_selector: default_title_selector(),
            link_selector: default_link_selector(),
            date_selector: default_date_selector(),
            summary_selector: default_summary_selector(),
        }
    }
}

/// One crawlable source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Host name; the unit of circuit breaking.
    pub domain: String,
    /// Canonical root used to resolve relative links.
    pub base_url: String,
    /// Search URL with a `{keyword}` placeholder.
    pub search_url_template: String,
    #[serde(default)]
    pub tier: SourceTier,
    /// Province or region the source covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub rules: ExtractionRules,
}

impl SourceConfig {
    /// Build the search URL for a keyword.
    pub fn search_url(&self, keyword: &str) -> String {
        let encoded = urlencoding::encode(keyword);
        self.search_url_template.replace("{keyword}", &encoded)
    }
}

/// Lookup table of configured sources.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    sources: Vec<SourceConfig>,
}

impl SourceTable {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self { sources }
    }

    pub fn domains(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.domain.clone()).collect()
    }

    /// Sources restricted to `domains`, ordered by tier (stable within a tier).
    pub fn prioritized(&self, domains: &[String]) -> Vec<SourceConfig> {
        let mut selected: Vec<SourceConfig> = self
            .sources
            .iter()
            .filter(|s| domains.iter().any(|d| d == &s.domain))
            .cloned()
            .collect();
        selected.sort_by_key(|s| s.tier);
        selected
    }

    /// Region configured for a domain, if any.
    pub fn region_of(&self, domain: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.domain == domain)
            .and_then(|s| s.region.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(domain: &str, tier: SourceTier) -> SourceConfig {
        SourceConfig {
            domain: domain.to_string(),
            base_url: format!("https://{}", domain),
            search_url_template: format!("https://{}/search?q={{keyword}}", domain),
            tier,
            region: None,
            rules: ExtractionRules::default(),
        }
    }

    #[test]
    fn test_search_url_encodes_keyword() {
        let s = source("moa.gov.cn", SourceTier::Official);
        assert_eq!(
            s.search_url("渔业 保险"),
            "https://moa.gov.cn/search?q=%E6%B8%94%E4%B8%9A%20%E4%BF%9D%E9%99%A9"
        );
    }

    #[test]
    fn test_prioritized_orders_by_tier() {
        let table = SourceTable::new(vec![
            source("fish.cn", SourceTier::Industry),
            source("xinhuanet.com", SourceTier::Media),
            source("moa.gov.cn", SourceTier::Official),
            source("agri.gov.cn", SourceTier::Official),
        ]);
        let all = table.domains();
        let ordered: Vec<String> = table
            .prioritized(&all)
            .into_iter()
            .map(|s| s.domain)
            .collect();
        assert_eq!(
            ordered,
            vec!["moa.gov.cn", "agri.gov.cn", "xinhuanet.com", "fish.cn"]
        );
    }

    #[test]
    fn test_region_of() {
        let mut zhejiang = source("zjoaf.gov.cn", SourceTier::Official);
        zhejiang.region = Some("浙江".to_string());
        let table = SourceTable::new(vec![zhejiang, source("moa.gov.cn", SourceTier::Official)]);
        assert_eq!(table.region_of("zjoaf.gov.cn"), Some("浙江"));
        assert_eq!(table.region_of("moa.gov.cn"), None);
        assert_eq!(table.region_of("unknown.cn"), None);
    }

    #[test]
    fn test_prioritized_skips_unavailable() {
        let table = SourceTable::new(vec![
            source("fish.cn", SourceTier::Industry),
            source("moa.gov.cn", SourceTier::Official),
        ]);
        let ordered = table.prioritized(&["fish.cn".to_string()]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].domain, "fish.cn");
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let json = r#"{
            "domain": "fish.cn",
            "base_url": "https://www.fish.cn",
            "search_url_template": "https://www.fish.cn/s?w={keyword}",
            "rules": { "item_selector": "div.news" }
        }"#;
        let s: SourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(s.tier, SourceTier::Industry);
        assert_eq!(s.rules.item_selector, "div.news");
        assert_eq!(s.rules.link_selector, "a[href]");
    }
}
