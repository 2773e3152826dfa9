//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use policyscout::config::Settings;
use policyscout::models::{Category, Record};
use policyscout::repository::CacheStore;
use policyscout::scrapers::{FetchError, FetchResponse, Fetcher, HealthRegistry, SecondarySource};
use policyscout::services::Harvester;
use policyscout::sources::{ExtractionRules, SourceConfig, SourceTier};

pub type Scripted = Result<FetchResponse, FetchError>;

/// Fetcher answering per host: queued responses first, then a fixed default.
#[derive(Default)]
pub struct ScriptedFetcher {
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    defaults: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always(self, host: &str, response: Scripted) -> Self {
        self.defaults
            .lock()
            .unwrap()
            .insert(host.to_string(), response);
        self
    }

    pub fn then(self, host: &str, responses: Vec<Scripted>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default()
            .extend(responses);
        self
    }

    pub fn calls(&self, host: &str) -> usize {
        self.calls.lock().unwrap().get(host).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();
        *self.calls.lock().unwrap().entry(host.clone()).or_insert(0) += 1;

        if let Some(next) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&host)
            .and_then(|q| q.pop_front())
        {
            return next;
        }
        self.defaults
            .lock()
            .unwrap()
            .get(&host)
            .cloned()
            .unwrap_or(Err(FetchError::Connection(format!("{} refused", host))))
    }
}

/// Secondary source returning a fixed record list per call.
pub struct FakeSecondary {
    pub records: Vec<Record>,
    pub calls: AtomicUsize,
}

impl FakeSecondary {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecondarySource for FakeSecondary {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, keyword: &str, now: DateTime<Utc>) -> Result<Vec<Record>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .iter()
            .cloned()
            .map(|mut r| {
                r.keyword = keyword.to_string();
                r.crawled_at = now;
                r
            })
            .collect())
    }
}

pub fn source(domain: &str, tier: SourceTier) -> SourceConfig {
    SourceConfig {
        domain: domain.to_string(),
        base_url: format!("https://{}", domain),
        search_url_template: format!("https://{}/search?q={{keyword}}", domain),
        tier,
        region: None,
        rules: ExtractionRules::default(),
    }
}

/// A results page with one item dated today.
pub fn results_page(title: &str, path: &str) -> String {
    format!(
        r#"<html><body><ul>
            <li><h3>{}</h3><a href="{}">详情</a><span class="date">{}</span><p>摘要：{}</p></li>
        </ul></body></html>"#,
        title,
        path,
        Utc::now().date_naive().format("%Y-%m-%d"),
        title
    )
}

pub fn record(id: &str, title: &str) -> Record {
    let now = Utc::now();
    Record {
        id: id.to_string(),
        title: title.to_string(),
        summary: format!("关于{}的摘要", title),
        url: format!("https://www.gov.cn/{}.html", id),
        source_domain: "gov.cn".to_string(),
        publish_date: now.date_naive(),
        keyword: "渔业保险".to_string(),
        category: Category::Funding,
        crawled_at: now,
        region: None,
        is_fallback: false,
    }
}

/// Fast settings over the given sources and keywords.
pub fn settings(data_dir: &Path, sources: Vec<SourceConfig>, keywords: &[&str]) -> Settings {
    let mut settings = Settings::with_data_dir(data_dir.to_path_buf());
    settings.sources = sources;
    settings.keywords = keywords.iter().map(|k| k.to_string()).collect();
    settings.workers = 2;
    settings.jitter_min_ms = 0;
    settings.jitter_max_ms = 0;
    settings.backoff_base_ms = 1;
    settings.request_timeout_secs = 2;
    settings
}

pub fn harvester(
    settings: Settings,
    fetcher: Arc<ScriptedFetcher>,
    secondary: Option<Arc<FakeSecondary>>,
) -> Harvester {
    let registry = HealthRegistry::new(settings.cooldowns());
    let cache = CacheStore::new(&settings.data_dir);
    let secondary = secondary.map(|s| s as Arc<dyn SecondarySource>);
    Harvester::new(settings, fetcher, registry, cache, secondary).unwrap()
}
