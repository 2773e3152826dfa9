//! Secondary source: a general web search used when primary sources yield nothing.
//!
//! Parsing is looser than the per-source extraction rules: a result needs only
//! a title and a link, the snippet is optional.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::extract::{resolve_link, SUMMARY_MAX_CHARS};
use super::http_client::{FetchError, Fetcher};
use crate::models::Record;
use crate::services::categorize::categorize;
use crate::utils::{collapse_whitespace, truncate_chars};

/// DuckDuckGo HTML search, which needs no API key.
pub const DEFAULT_SEARCH_URL: &str = "https://html.duckduckgo.com/html/?q={keyword}";

/// Per-keyword record cap for the secondary source.
pub const DEFAULT_RESULT_CAP: usize = 5;

/// A fallback provider of records for a keyword.
#[async_trait]
pub trait SecondarySource: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, keyword: &str, now: DateTime<Utc>) -> Result<Vec<Record>, FetchError>;
}

/// Settings for the search-engine secondary source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryConfig {
    /// Search URL with a `{keyword}` placeholder.
    #[serde(default = "default_search_url")]
    pub search_url_template: String,
    /// Restrict results to a site, e.g. `gov.cn`. Appended as `site:` to the query.
    #[serde(default)]
    pub site_filter: Option<String>,
    /// How many leading keywords are searched.
    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: usize,
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_keyword_limit() -> usize {
    3
}

fn default_result_cap() -> usize {
    DEFAULT_RESULT_CAP
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            search_url_template: default_search_url(),
            site_filter: None,
            keyword_limit: default_keyword_limit(),
            result_cap: default_result_cap(),
        }
    }
}

/// Secondary source backed by an HTML search results page.
pub struct SearchEngineSource {
    config: SecondaryConfig,
    fetcher: Arc<dyn Fetcher>,
}

impl SearchEngineSource {
    pub fn new(config: SecondaryConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    fn query_url(&self, keyword: &str) -> String {
        let query = match &self.config.site_filter {
            Some(site) => format!("{} site:{}", keyword, site),
            None => keyword.to_string(),
        };
        self.config
            .search_url_template
            .replace("{keyword}", &urlencoding::encode(&query))
    }
}

/// Unwrap a search engine redirect link to the target URL.
fn extract_url(href: &str) -> Option<String> {
    if href.contains("duckduckgo.com/l/") {
        let start = href.find("uddg=")? + 5;
        let encoded = &href[start..];
        let end = encoded.find('&').unwrap_or(encoded.len());
        return urlencoding::decode(&encoded[..end])
            .ok()
            .map(|s| s.into_owned());
    }
    if href.starts_with("//") {
        return Some(format!("https:{}", href));
    }
    resolve_link("https://html.duckduckgo.com/", href)
}

/// Parse search results into records, one per `.result` block.
pub fn parse_results(html: &str, keyword: &str, now: DateTime<Utc>, cap: usize) -> Vec<Record> {
    let document = Html::parse_document(html);
    let (Ok(result_sel), Ok(snippet_sel), Ok(block_sel)) = (
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
        Selector::parse(".result"),
    ) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for block in document.select(&block_sel) {
        if records.len() >= cap {
            break;
        }
        let Some(element) = block.select(&result_sel).next() else {
            continue;
        };
        let Some(url) = element.value().attr("href").and_then(extract_url) else {
            continue;
        };
        let Some(domain) = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        else {
            continue;
        };
        let title = collapse_whitespace(&element.text().collect::<String>());
        if title.is_empty() {
            continue;
        }

        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        let summary = match snippet {
            Some(s) => truncate_chars(&s, SUMMARY_MAX_CHARS),
            None => format!("关于{}的最新政策动态，来源：{}", keyword, domain),
        };

        records.push(Record {
            id: Record::compute_id(&domain, Some(&url)),
            category: categorize(keyword, &title),
            title,
            summary,
            url,
            source_domain: domain,
            publish_date: now.date_naive(),
            keyword: keyword.to_string(),
            crawled_at: now,
            region: None,
            is_fallback: false,
        });
    }
    records
}

#[async_trait]
impl SecondarySource for SearchEngineSource {
    fn name(&self) -> &str {
        "search"
    }

    async fn search(&self, keyword: &str, now: DateTime<Utc>) -> Result<Vec<Record>, FetchError> {
        let url = self.query_url(keyword);
        debug!("Secondary search: {}", url);

        let response = self.fetcher.get(&url).await?;
        if !response.is_success() {
            return Err(FetchError::Connection(format!(
                "search returned HTTP {}",
                response.status
            )));
        }

        let records = parse_results(&response.body, keyword, now, self.config.result_cap);
        debug!("Parsed {} secondary results for {}", records.len(), keyword);
        Ok(records)
    }
}
