//! Configuration management for policyscout using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::RetentionPolicy;
use crate::scrapers::{Cooldowns, SchedulerConfig, SecondaryConfig};
use crate::sources::{default_keywords, default_sources, SourceConfig, SourceTable};

/// Upper bound on crawl workers.
pub const MAX_WORKERS: usize = 16;

/// Upper bound on either retention window.
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// Upper bound on either domain cooldown (one week).
pub const MAX_COOLDOWN_MINS: i64 = 7 * 24 * 60;

/// Upper bound on the cache staleness threshold (30 days).
pub const MAX_STALE_HOURS: i64 = 30 * 24;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "POLICYSCOUT_DATA_DIR";

/// Environment variable overriding the worker count.
pub const WORKERS_ENV: &str = "POLICYSCOUT_WORKERS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the cache and health files.
    pub data_dir: PathBuf,
    /// User agent config: None for the default, "impersonate", or a custom string.
    pub user_agent: Option<String>,
    pub request_timeout_secs: u64,
    pub workers: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub per_page_cap: usize,
    /// Cache age after which a run crawls instead of serving the cache.
    pub stale_after_hours: i64,
    pub retention_days: i64,
    /// Retention for policy and funding records.
    pub extended_retention_days: i64,
    pub terminal_cooldown_mins: i64,
    pub transient_cooldown_mins: i64,
    pub keywords: Vec<String>,
    pub sources: Vec<SourceConfig>,
    pub secondary: SecondaryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: local data dir -> home dir -> current dir
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("policyscout");

        let scheduler = SchedulerConfig::default();
        let retention = RetentionPolicy::default();
        let cooldowns = Cooldowns::default();

        Self {
            data_dir,
            user_agent: None,
            request_timeout_secs: scheduler.request_timeout.as_secs(),
            workers: scheduler.workers,
            jitter_min_ms: scheduler.jitter_min_ms,
            jitter_max_ms: scheduler.jitter_max_ms,
            max_retries: scheduler.max_retries,
            backoff_base_ms: scheduler.backoff_base_ms,
            per_page_cap: scheduler.per_page_cap,
            stale_after_hours: 6,
            retention_days: retention.default_days,
            extended_retention_days: retention.extended_days,
            terminal_cooldown_mins: cooldowns.terminal.num_minutes(),
            transient_cooldown_mins: cooldowns.transient.num_minutes(),
            keywords: default_keywords(),
            sources: default_sources(),
            secondary: SecondaryConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            workers: self.workers,
            jitter_min_ms: self.jitter_min_ms,
            jitter_max_ms: self.jitter_max_ms,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_retries: self.max_retries,
            backoff_base_ms: self.backoff_base_ms,
            per_page_cap: self.per_page_cap,
        }
    }

    pub fn cooldowns(&self) -> Cooldowns {
        Cooldowns {
            terminal: chrono::Duration::minutes(self.terminal_cooldown_mins),
            transient: chrono::Duration::minutes(self.transient_cooldown_mins),
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            default_days: self.retention_days,
            extended_days: self.extended_retention_days,
        }
    }

    pub fn stale_threshold(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stale_after_hours)
    }

    pub fn source_table(&self) -> SourceTable {
        SourceTable::new(self.sources.clone())
    }

    /// Path of the domain health file.
    pub fn health_path(&self) -> PathBuf {
        self.data_dir.join(crate::scrapers::domain_health::HEALTH_FILE)
    }

    /// Reject settings the crawl engine can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.workers == 0 || self.workers > MAX_WORKERS {
            return invalid(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.workers
            ));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return invalid("keyword list is empty".to_string());
        }
        if self.sources.is_empty() {
            return invalid("source list is empty".to_string());
        }
        for source in &self.sources {
            if source.domain.trim().is_empty() {
                return invalid("source with empty domain".to_string());
            }
            if !source.search_url_template.contains("{keyword}") {
                return invalid(format!(
                    "search_url_template for {} has no {{keyword}} placeholder",
                    source.domain
                ));
            }
            if url::Url::parse(&source.base_url).is_err() {
                return invalid(format!("base_url for {} is not a URL", source.domain));
            }
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return invalid(format!(
                "jitter_min_ms ({}) exceeds jitter_max_ms ({})",
                self.jitter_min_ms, self.jitter_max_ms
            ));
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be positive".to_string());
        }
        if self.per_page_cap == 0 {
            return invalid("per_page_cap must be positive".to_string());
        }
        if self.stale_after_hours <= 0 || self.stale_after_hours > MAX_STALE_HOURS {
            return invalid(format!(
                "stale_after_hours must be between 1 and {}, got {}",
                MAX_STALE_HOURS, self.stale_after_hours
            ));
        }
        if self.retention_days <= 0
            || self.extended_retention_days < self.retention_days
            || self.extended_retention_days > MAX_RETENTION_DAYS
        {
            return invalid(format!(
                "retention windows {}/{} days must be ascending and at most {}",
                self.retention_days, self.extended_retention_days, MAX_RETENTION_DAYS
            ));
        }
        if self.transient_cooldown_mins <= 0
            || self.terminal_cooldown_mins <= self.transient_cooldown_mins
            || self.terminal_cooldown_mins > MAX_COOLDOWN_MINS
        {
            return invalid(format!(
                "cooldowns must satisfy 0 < transient ({}) < terminal ({}) <= {}",
                self.transient_cooldown_mins, self.terminal_cooldown_mins, MAX_COOLDOWN_MINS
            ));
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// User agent string, or "impersonate".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_min_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_max_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_base_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page_cap: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_after_hours: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_retention_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_cooldown_mins: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient_cooldown_mins: Option<i64>,
    /// Replaces the built-in keyword list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Replaces the built-in source table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SecondaryConfig>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers policyscout config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("policyscout").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_err(e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| parse_err(e.to_string())),
            _ => serde_json::from_str(contents).map_err(|e| parse_err(e.to_string())),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(v) = self.request_timeout_secs {
            settings.request_timeout_secs = v;
        }
        if let Some(v) = self.workers {
            settings.workers = v;
        }
        if let Some(v) = self.jitter_min_ms {
            settings.jitter_min_ms = v;
        }
        if let Some(v) = self.jitter_max_ms {
            settings.jitter_max_ms = v;
        }
        if let Some(v) = self.max_retries {
            settings.max_retries = v;
        }
        if let Some(v) = self.backoff_base_ms {
            settings.backoff_base_ms = v;
        }
        if let Some(v) = self.per_page_cap {
            settings.per_page_cap = v;
        }
        if let Some(v) = self.stale_after_hours {
            settings.stale_after_hours = v;
        }
        if let Some(v) = self.retention_days {
            settings.retention_days = v;
        }
        if let Some(v) = self.extended_retention_days {
            settings.extended_retention_days = v;
        }
        if let Some(v) = self.terminal_cooldown_mins {
            settings.terminal_cooldown_mins = v;
        }
        if let Some(v) = self.transient_cooldown_mins {
            settings.transient_cooldown_mins = v;
        }
        if let Some(ref keywords) = self.keywords {
            settings.keywords = keywords.clone();
        }
        if let Some(ref sources) = self.sources {
            settings.sources = sources.clone();
        }
        if let Some(ref secondary) = self.secondary {
            settings.secondary = secondary.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (--data flag).
    pub data: Option<PathBuf>,
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load settings with explicit options.
///
/// Precedence, lowest to highest: defaults, config file, environment, `--data`.
/// An explicit config path that can't be read or parsed is an error; a
/// discovered one is skipped with a warning.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config.base_dir().unwrap_or_else(current_dir);
    config.apply_to_settings(&mut settings, &base_dir);

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;

    if let Some(data) = options.data {
        settings.data_dir = config.resolve_path(&data.to_string_lossy(), &current_dir());
    }

    Ok((settings, config))
}

/// Apply POLICYSCOUT_* environment overrides through `lookup`.
fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|s| !s.is_empty()) {
        tracing::debug!("Using {} from environment: {}", DATA_DIR_ENV, dir);
        let expanded = shellexpand::tilde(&dir);
        settings.data_dir = PathBuf::from(expanded.as_ref());
    }

    if let Some(raw) = lookup(WORKERS_ENV).filter(|s| !s.is_empty()) {
        settings.workers = raw.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!("{} must be a number, got {:?}", WORKERS_ENV, raw))
        })?;
    }

    Ok(())
}
