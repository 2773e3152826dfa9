//! Bounded-concurrency crawl scheduler.
//!
//! Every (keyword, source) pair becomes one task on a shared queue. A fixed
//! pool of workers pops tasks from the front, sleeps a random jitter, fetches
//! with a scheduler-enforced timeout, retries timeouts and 5xx with
//! exponential backoff, and reports failures to the health registry. One
//! task failing (or panicking) never affects its siblings.

use std::collections::{BTreeSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::domain_health::{FailureKind, HealthRegistry};
use super::extract::{dedupe_batch, extract_records};
use super::http_client::Fetcher;
use crate::models::Record;
use crate::sources::SourceConfig;

/// Upper bound on any single backoff sleep.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Calculate exponential backoff delay for a given attempt.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

/// Tuning knobs for a crawl cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub workers: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Maximum candidates examined per results page.
    pub per_page_cap: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            jitter_min_ms: 1000,
            jitter_max_ms: 5000,
            request_timeout: Duration::from_secs(15),
            max_retries: 2,
            backoff_base_ms: 1000,
            per_page_cap: 5,
        }
    }
}

/// One unit of crawl work.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// Position in the cycle's task order; results are reassembled by it.
    pub index: usize,
    pub keyword: String,
    pub source: SourceConfig,
}

impl CrawlTask {
    pub fn url(&self) -> String {
        self.source.search_url(&self.keyword)
    }
}

/// Build the ordered task queue: by source tier, then keyword order, then
/// source order within a tier.
pub fn build_tasks(keywords: &[String], sources: &[SourceConfig]) -> VecDeque<CrawlTask> {
    let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(keywords.len() * sources.len());
    for (si, _) in sources.iter().enumerate() {
        for (ki, _) in keywords.iter().enumerate() {
            pairs.push((ki, si));
        }
    }
    pairs.sort_by_key(|&(ki, si)| (sources[si].tier, ki, si));

    pairs
        .into_iter()
        .enumerate()
        .map(|(index, (ki, si))| CrawlTask {
            index,
            keyword: keywords[ki].clone(),
            source: sources[si].clone(),
        })
        .collect()
}

/// Summary of one crawl cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlReport {
    pub tasks: usize,
    pub succeeded: usize,
    pub terminal_failures: usize,
    pub transient_failures: usize,
    pub records: usize,
    /// Domains that failed at least once during the cycle.
    pub failed_domains: BTreeSet<String>,
}

impl CrawlReport {
    pub fn failed(&self) -> usize {
        self.terminal_failures + self.transient_failures
    }

    fn absorb(&mut self, other: CrawlReport) {
        self.tasks += other.tasks;
        self.succeeded += other.succeeded;
        self.terminal_failures += other.terminal_failures;
        self.transient_failures += other.transient_failures;
        self.failed_domains.extend(other.failed_domains);
    }

    fn note_failure(&mut self, domain: &str, kind: FailureKind) {
        match kind {
            FailureKind::Terminal => self.terminal_failures += 1,
            FailureKind::Transient => self.transient_failures += 1,
        }
        self.failed_domains.insert(domain.to_string());
    }
}

/// Runs crawl tasks over a fixed worker pool.
#[derive(Clone)]
pub struct CrawlScheduler {
    config: SchedulerConfig,
    fetcher: Arc<dyn Fetcher>,
    registry: HealthRegistry,
}

impl CrawlScheduler {
    pub fn new(
        config: SchedulerConfig,
        fetcher: Arc<dyn Fetcher>,
        registry: HealthRegistry,
    ) -> Self {
        Self {
            config,
            fetcher,
            registry,
        }
    }

    /// Crawl every (keyword, source) pair and return the union of records.
    ///
    /// `sources` should already be filtered to available domains.
    pub async fn run(
        &self,
        keywords: &[String],
        sources: &[SourceConfig],
        crawled_at: DateTime<Utc>,
    ) -> (Vec<Record>, CrawlReport) {
        let tasks = build_tasks(keywords, sources);
        if tasks.is_empty() {
            return (Vec::new(), CrawlReport::default());
        }

        let worker_count = self.config.workers.clamp(1, tasks.len());
        info!(
            "Crawling {} tasks across {} sources with {} workers",
            tasks.len(),
            sources.len(),
            worker_count
        );

        let queue = Arc::new(Mutex::new(tasks));
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = queue.clone();
            let scheduler = self.clone();
            handles.push(tokio::spawn(async move {
                scheduler.worker(worker_id, queue, crawled_at).await
            }));
        }

        let mut pages: Vec<(usize, Vec<Record>)> = Vec::new();
        let mut report = CrawlReport::default();
        for handle in handles {
            match handle.await {
                Ok((worker_pages, worker_report)) => {
                    pages.extend(worker_pages);
                    report.absorb(worker_report);
                }
                Err(e) => error!("Crawl worker died: {}", e),
            }
        }

        pages.sort_by_key(|(index, _)| *index);
        let records = dedupe_batch(pages.into_iter().flat_map(|(_, r)| r).collect());
        report.records = records.len();

        info!(
            "Crawl finished: {}/{} tasks succeeded, {} records",
            report.succeeded, report.tasks, report.records
        );
        (records, report)
    }

    async fn worker(
        &self,
        worker_id: usize,
        queue: Arc<Mutex<VecDeque<CrawlTask>>>,
        crawled_at: DateTime<Utc>,
    ) -> (Vec<(usize, Vec<Record>)>, CrawlReport) {
        let mut pages = Vec::new();
        let mut report = CrawlReport::default();

        loop {
            let task = {
                let mut q = queue.lock().await;
                q.pop_front()
            };
            let Some(task) = task else { break };
            report.tasks += 1;

            let domain = task.source.domain.clone();
            let outcome = AssertUnwindSafe(self.process(&task, crawled_at))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(records)) => {
                    report.succeeded += 1;
                    pages.push((task.index, records));
                }
                Ok(Err(kind)) => {
                    report.note_failure(&domain, kind);
                }
                Err(_) => {
                    error!(
                        "Worker {} panicked on task {} ({}); continuing",
                        worker_id, domain, task.keyword
                    );
                    self.registry
                        .record_failure_kind(&domain, Utc::now(), FailureKind::Transient)
                        .await;
                    report.note_failure(&domain, FailureKind::Transient);
                }
            }
        }

        debug!("Worker {} done after {} tasks", worker_id, report.tasks);
        (pages, report)
    }

    async fn process(
        &self,
        task: &CrawlTask,
        crawled_at: DateTime<Utc>,
    ) -> Result<Vec<Record>, FailureKind> {
        self.jitter().await;

        let url = task.url();
        let domain = &task.source.domain;
        match self.fetch_with_retry(&url).await {
            Ok(body) => {
                self.registry.record_success(domain, Utc::now()).await;
                let records = extract_records(
                    &body,
                    &task.keyword,
                    &task.source,
                    crawled_at,
                    self.config.per_page_cap,
                );
                debug!("{} [{}]: {} records", domain, task.keyword, records.len());
                Ok(records)
            }
            Err(kind) => {
                self.registry
                    .record_failure_kind(domain, Utc::now(), kind)
                    .await;
                Err(kind)
            }
        }
    }

    async fn jitter(&self) {
        let (min, max) = (self.config.jitter_min_ms, self.config.jitter_max_ms);
        if max == 0 {
            return;
        }
        let delay = rand::rng().random_range(min.min(max)..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    /// Fetch a URL, retrying timeouts and 5xx. Returns the body of a 2xx.
    async fn fetch_with_retry(&self, url: &str) -> Result<String, FailureKind> {
        let mut attempt: u32 = 0;
        loop {
            let result =
                tokio::time::timeout(self.config.request_timeout, self.fetcher.get(url)).await;

            match result {
                Ok(Ok(resp)) if resp.is_success() => return Ok(resp.body),
                Ok(Ok(resp)) if resp.is_not_found() => {
                    warn!("{} returned 404, not retrying", url);
                    return Err(FailureKind::Terminal);
                }
                Ok(Ok(resp)) if resp.is_server_error() => {
                    debug!("{} returned {} (attempt {})", url, resp.status, attempt + 1);
                }
                Ok(Ok(resp)) => {
                    warn!("{} returned HTTP {}", url, resp.status);
                    return Err(FailureKind::Transient);
                }
                Ok(Err(e)) if e.is_retryable() => {
                    debug!("{}: {} (attempt {})", url, e, attempt + 1);
                }
                Ok(Err(e)) => {
                    warn!("{}: {}", url, e);
                    return Err(FailureKind::Transient);
                }
                Err(_) => {
                    debug!(
                        "{} timed out after {:?} (attempt {})",
                        url,
                        self.config.request_timeout,
                        attempt + 1
                    );
                }
            }

            if attempt >= self.config.max_retries {
                warn!("{} failed after {} attempts", url, attempt + 1);
                return Err(FailureKind::Transient);
            }
            tokio::time::sleep(backoff_delay(attempt, self.config.backoff_base_ms)).await;
            attempt += 1;
        }
    }
}
