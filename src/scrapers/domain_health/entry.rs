//! Per-domain circuit breaker state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a failed request is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Page gone (404). Long cooldown, never retried.
    Terminal,
    /// Timeout, 5xx, connection trouble. Short cooldown.
    Transient,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terminal => "terminal",
            Self::Transient => "transient",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State for a single domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainHealthEntry {
    pub domain: String,
    pub disabled: bool,
    /// Instant after which the domain is eligible again.
    pub disabled_until: Option<DateTime<Utc>>,
    pub last_checked: DateTime<Utc>,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<FailureKind>,
}

impl DomainHealthEntry {
    pub fn new(domain: &str, now: DateTime<Utc>) -> Self {
        Self {
            domain: domain.to_string(),
            disabled: false,
            disabled_until: None,
            last_checked: now,
            failure_count: 0,
            last_failure: None,
        }
    }

    /// Eligible iff not disabled, or the cooldown has elapsed.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        if !self.disabled {
            return true;
        }
        match self.disabled_until {
            Some(until) => now >= until,
            None => true,
        }
    }

    /// Disable until `until`, keeping an existing later deadline.
    pub fn disable(&mut self, until: DateTime<Utc>, kind: FailureKind, now: DateTime<Utc>) {
        let keep_existing = self.disabled
            && self
                .disabled_until
                .map(|existing| existing > until)
                .unwrap_or(false);
        if !keep_existing {
            self.disabled_until = Some(until);
        }
        self.disabled = true;
        self.last_checked = now;
        self.failure_count += 1;
        self.last_failure = Some(kind);
    }
}
