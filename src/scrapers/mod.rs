//! Crawling: fetching, circuit breaking, scheduling and extraction.

pub mod domain_health;
pub mod extract;
pub mod http_client;
pub mod scheduler;
pub mod secondary;

pub use domain_health::{Cooldowns, DomainHealthEntry, FailureKind, HealthRegistry};
pub use extract::{dedupe_batch, extract_records};
pub use http_client::{FetchError, FetchResponse, Fetcher, HttpClient};
pub use scheduler::{backoff_delay, CrawlReport, CrawlScheduler, CrawlTask, SchedulerConfig};
pub use secondary::{SearchEngineSource, SecondaryConfig, SecondarySource};
