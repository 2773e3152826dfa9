//! Fallback cascade controller.
//!
//! A run serves the cache while it is fresh; otherwise it walks the cascade
//! primary crawl -> secondary search -> last good cache -> static stub and
//! returns the first non-empty result. A run never fails because sources are
//! down: only invalid configuration and cache write failures are errors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, Settings};
use crate::models::Record;
use crate::repository::{is_stale, merge, prune, CacheStore, Snapshot, StoreError};
use crate::scrapers::domain_health::{load_health_state, save_health_state};
use crate::scrapers::{
    dedupe_batch, CrawlReport, CrawlScheduler, FetchError, Fetcher, HealthRegistry, HttpClient,
    SearchEngineSource, SecondarySource,
};
use crate::sources::SourceTable;

/// Log target for operational alerts.
pub const ALERT_TARGET: &str = "policyscout::alert";

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
}

/// Which cascade stage produced a run's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStage {
    /// Cache was fresh; nothing crawled.
    CacheFresh,
    Primary,
    Secondary,
    /// Every crawl came up empty; the last saved records were served as-is.
    StaleCache,
    /// Nothing available anywhere; a single placeholder record was served.
    Stub,
}

impl HarvestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFresh => "cache_fresh",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::StaleCache => "stale_cache",
            Self::Stub => "stub",
        }
    }

    /// Whether the records came from a degraded stage.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::StaleCache | Self::Stub)
    }
}

impl std::fmt::Display for HarvestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestOutcome {
    pub records: Vec<Record>,
    pub stage: HarvestStage,
    /// Present when the primary crawl ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CrawlReport>,
}

/// Owns the crawl engine's stores and runs the cascade.
pub struct Harvester {
    settings: Settings,
    sources: SourceTable,
    registry: HealthRegistry,
    cache: CacheStore,
    scheduler: CrawlScheduler,
    secondary: Option<Arc<dyn SecondarySource>>,
    health_path: PathBuf,
    in_flight: Mutex<()>,
}

impl Harvester {
    /// Build a harvester from explicit parts. Fails on invalid settings.
    pub fn new(
        settings: Settings,
        fetcher: Arc<dyn Fetcher>,
        registry: HealthRegistry,
        cache: CacheStore,
        secondary: Option<Arc<dyn SecondarySource>>,
    ) -> Result<Self, HarvestError> {
        settings.validate()?;

        let scheduler = CrawlScheduler::new(settings.scheduler_config(), fetcher, registry.clone());
        Ok(Self {
            sources: settings.source_table(),
            health_path: settings.health_path(),
            settings,
            registry,
            cache,
            scheduler,
            secondary,
            in_flight: Mutex::new(()),
        })
    }

    /// Build a harvester with the HTTP client, persisted health state and
    /// search-engine secondary source described by `settings`.
    pub async fn from_settings(settings: Settings) -> Result<Self, HarvestError> {
        settings.validate()?;

        let client = HttpClient::new(
            Duration::from_secs(settings.request_timeout_secs),
            settings.user_agent.as_deref(),
        )?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(client);

        let registry = HealthRegistry::new(settings.cooldowns());
        load_health_state(&registry, &settings.health_path()).await;

        let cache = CacheStore::new(&settings.data_dir);
        let secondary: Arc<dyn SecondarySource> = Arc::new(SearchEngineSource::new(
            settings.secondary.clone(),
            fetcher.clone(),
        ));

        Self::new(settings, fetcher, registry, cache, Some(secondary))
    }

    pub fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Run one cycle. `full_refresh` skips the freshness check and always crawls.
    ///
    /// Overlapping calls are serialized; a call that waited re-checks the
    /// cache, so it usually gets the records the previous call just saved.
    pub async fn run(&self, full_refresh: bool) -> Result<HarvestOutcome, HarvestError> {
        let _guard = self.in_flight.lock().await;
        let now = Utc::now();
        let snapshot = self.cache.load();

        if !full_refresh
            && !snapshot.is_empty()
            && !is_stale(&snapshot, now, self.settings.stale_threshold())
        {
            debug!("Cache is fresh ({} records)", snapshot.len());
            return Ok(HarvestOutcome {
                records: snapshot.records,
                stage: HarvestStage::CacheFresh,
                report: None,
            });
        }

        let (primary, report) = self.crawl_primary(now).await;
        if !primary.is_empty() {
            let saved = self.merge_and_save(&snapshot, &primary, now)?;
            if !saved.is_empty() {
                info!(
                    "Primary crawl produced {} records ({} cached)",
                    primary.len(),
                    saved.len()
                );
                return Ok(HarvestOutcome {
                    records: saved.records,
                    stage: HarvestStage::Primary,
                    report: Some(report),
                });
            }
        }
        warn!("Primary crawl produced no records, trying secondary source");

        let secondary = self.search_secondary(now).await;
        if !secondary.is_empty() {
            self.merge_and_save(&snapshot, &secondary, now)?;
            info!("Secondary source produced {} records", secondary.len());
            return Ok(HarvestOutcome {
                records: secondary,
                stage: HarvestStage::Secondary,
                report: Some(report),
            });
        }

        if !snapshot.is_empty() {
            warn!(
                "All sources empty, serving {} records from last good cache",
                snapshot.len()
            );
            return Ok(HarvestOutcome {
                records: snapshot.records,
                stage: HarvestStage::StaleCache,
                report: Some(report),
            });
        }

        error!(
            target: ALERT_TARGET,
            "No policy data available: every source failed and the cache is empty"
        );
        Ok(HarvestOutcome {
            records: vec![Record::fallback_stub(now)],
            stage: HarvestStage::Stub,
            report: Some(report),
        })
    }

    async fn crawl_primary(&self, now: DateTime<Utc>) -> (Vec<Record>, CrawlReport) {
        let available = self
            .registry
            .available_domains(&self.sources.domains(), now)
            .await;
        let sources = self.sources.prioritized(&available);

        let result = if sources.is_empty() {
            warn!("No available domains, skipping primary crawl");
            (Vec::new(), CrawlReport::default())
        } else {
            self.scheduler
                .run(&self.settings.keywords, &sources, now)
                .await
        };

        if let Err(e) = save_health_state(&self.registry, &self.health_path).await {
            warn!("Failed to persist domain health: {}", e);
        }
        result
    }

    async fn search_secondary(&self, now: DateTime<Utc>) -> Vec<Record> {
        let Some(source) = &self.secondary else {
            return Vec::new();
        };
        // Generous bound; the fetcher enforces its own timeout too.
        let limit = Duration::from_secs(self.settings.request_timeout_secs.saturating_mul(2));

        let mut records = Vec::new();
        for keyword in self
            .settings
            .keywords
            .iter()
            .take(self.settings.secondary.keyword_limit)
        {
            match tokio::time::timeout(limit, source.search(keyword, now)).await {
                Ok(Ok(found)) => records.extend(found),
                Ok(Err(e)) => warn!(
                    "Secondary source {} failed for {}: {}",
                    source.name(),
                    keyword,
                    e
                ),
                Err(_) => warn!(
                    "Secondary source {} timed out for {}",
                    source.name(),
                    keyword
                ),
            }
        }
        dedupe_batch(merge(&[], &records))
    }

    fn merge_and_save(
        &self,
        snapshot: &Snapshot,
        batch: &[Record],
        now: DateTime<Utc>,
    ) -> Result<Snapshot, StoreError> {
        let merged = prune(
            merge(&snapshot.records, batch),
            now,
            &self.settings.retention(),
        );
        self.cache.save(&merged)
    }
}
