//! Per-domain health registry (circuit breaker).
//!
//! A domain that fails is disabled for a cooldown that depends on how it
//! failed. Eligibility is checked once at the start of a cycle; a domain that
//! trips mid-cycle still finishes the tasks already queued for it. Recovery is
//! purely time based: no half-open trial request is made.

mod entry;
mod persistence;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use entry::{DomainHealthEntry, FailureKind};
pub use persistence::{load_health_state, read_health_file, save_health_state, HEALTH_FILE};

/// Cooldown lengths per failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldowns {
    pub terminal: Duration,
    pub transient: Duration,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            terminal: Duration::minutes(60),
            transient: Duration::minutes(30),
        }
    }
}

/// Shared registry of domain health entries.
///
/// All mutation goes through one mutex around the whole map, so a
/// read-modify-write of an entry is never interleaved with another worker's.
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    cooldowns: Cooldowns,
    pub(crate) entries: Arc<Mutex<HashMap<String, DomainHealthEntry>>>,
}

impl HealthRegistry {
    pub fn new(cooldowns: Cooldowns) -> Self {
        Self {
            cooldowns,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cooldown for a failure kind. Terminal failures always cool down longer.
    pub fn cooldown_for(&self, kind: FailureKind) -> Duration {
        match kind {
            FailureKind::Terminal => self.cooldowns.terminal,
            FailureKind::Transient => self.cooldowns.transient,
        }
    }

    /// Whether a domain may be crawled at `now`. Unknown domains are available.
    pub async fn is_available(&self, domain: &str, now: DateTime<Utc>) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(domain)
            .map(|e| e.is_available(now))
            .unwrap_or(true)
    }

    /// Filter a domain list down to the currently available ones, preserving order.
    pub async fn available_domains(&self, domains: &[String], now: DateTime<Utc>) -> Vec<String> {
        let entries = self.entries.lock().await;
        domains
            .iter()
            .filter(|d| {
                let available = entries.get(*d).map(|e| e.is_available(now)).unwrap_or(true);
                if !available {
                    debug!("Skipping disabled domain {}", d);
                }
                available
            })
            .cloned()
            .collect()
    }

    /// Disable a domain for `cooldown` starting at `now`.
    ///
    /// A cooldown at least as long as the terminal one is recorded as terminal.
    pub async fn record_failure(&self, domain: &str, now: DateTime<Utc>, cooldown: Duration) {
        let kind = if cooldown >= self.cooldowns.terminal {
            FailureKind::Terminal
        } else {
            FailureKind::Transient
        };
        self.disable(domain, now, cooldown, kind).await;
    }

    /// Disable a domain with the configured cooldown for `kind`.
    pub async fn record_failure_kind(&self, domain: &str, now: DateTime<Utc>, kind: FailureKind) {
        self.disable(domain, now, self.cooldown_for(kind), kind).await;
    }

    async fn disable(
        &self,
        domain: &str,
        now: DateTime<Utc>,
        cooldown: Duration,
        kind: FailureKind,
    ) {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(domain.to_string())
            .or_insert_with(|| DomainHealthEntry::new(domain, now));
        entry.disable(now + cooldown, kind, now);
        warn!(
            "Domain {} disabled after {} failure until {}",
            domain,
            kind,
            entry
                .disabled_until
                .map(|u| u.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default()
        );
    }

    /// Note a successful fetch. Bookkeeping only; never re-enables a domain.
    pub async fn record_success(&self, domain: &str, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(domain) {
            entry.last_checked = now;
        }
    }

    pub async fn get(&self, domain: &str) -> Option<DomainHealthEntry> {
        self.entries.lock().await.get(domain).cloned()
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new(Cooldowns::default())
    }
}
