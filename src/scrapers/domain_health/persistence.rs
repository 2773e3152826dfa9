//! JSON file persistence for domain health state.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use super::entry::DomainHealthEntry;
use super::HealthRegistry;
use crate::utils::write_json_atomic;

/// File name of the registry inside the data directory.
pub const HEALTH_FILE: &str = "domain_health.json";

/// Read a persisted registry map.
///
/// Missing, unreadable or malformed files yield an empty map; a bad file
/// must never stop a crawl cycle.
pub fn read_health_file(path: &Path) -> HashMap<String, DomainHealthEntry> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No domain health file at {}", path.display());
            return HashMap::new();
        }
        Err(e) => {
            warn!("Failed to read domain health file {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    match serde_json::from_slice::<HashMap<String, DomainHealthEntry>>(&bytes) {
        Ok(map) => map,
        Err(e) => {
            warn!(
                "Domain health file {} is malformed, starting empty: {}",
                path.display(),
                e
            );
            HashMap::new()
        }
    }
}

/// Load persisted state into a registry. Returns the number of entries restored.
pub async fn load_health_state(registry: &HealthRegistry, path: &Path) -> usize {
    let loaded = read_health_file(path);
    let count = loaded.len();

    let mut entries = registry.entries.lock().await;
    for (domain, entry) in loaded {
        entries.insert(domain, entry);
    }

    if count > 0 {
        info!("Loaded health state for {} domains", count);
    }
    count
}

/// Save registry state with an atomic replace. Returns the number of entries written.
pub async fn save_health_state(registry: &HealthRegistry, path: &Path) -> std::io::Result<usize> {
    // Holding the lock across the write serializes concurrent savers.
    let entries = registry.entries.lock().await;
    write_json_atomic(path, &*entries)?;
    debug!(
        "Saved health state for {} domains to {}",
        entries.len(),
        path.display()
    );
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::domain_health::{Cooldowns, FailureKind};
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HEALTH_FILE);
        let now = Utc::now();

        let registry = HealthRegistry::new(Cooldowns::default());
        registry
            .record_failure("moa.gov.cn", now, registry.cooldown_for(FailureKind::Terminal))
            .await;
        assert_eq!(save_health_state(&registry, &path).await.unwrap(), 1);

        let restored = HealthRegistry::new(Cooldowns::default());
        assert_eq!(load_health_state(&restored, &path).await, 1);
        assert!(!restored.is_available("moa.gov.cn", now).await);
    }

    #[tokio::test]
    async fn test_malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HEALTH_FILE);
        std::fs::write(&path, b"{\"moa.gov.cn\": 42}").unwrap();

        assert!(read_health_file(&path).is_empty());
        assert!(read_health_file(&dir.path().join("missing.json")).is_empty());
    }

    #[test]
    fn test_file_format_is_domain_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HEALTH_FILE);
        std::fs::write(
            &path,
            r#"{"fish.cn": {
                "domain": "fish.cn",
                "disabled": true,
                "disabled_until": "2030-01-01T00:00:00Z",
                "last_checked": "2029-12-31T23:00:00Z"
            }}"#,
        )
        .unwrap();

        let map = read_health_file(&path);
        let entry = map.get("fish.cn").unwrap();
        assert!(entry.disabled);
        assert_eq!(entry.failure_count, 0);
    }
}
