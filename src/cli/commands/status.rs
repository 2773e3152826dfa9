//! Status command for showing cache and domain health.

use chrono::{Local, Utc};
use console::style;
use serde_json::json;

use crate::config::Settings;
use crate::repository::{is_stale, summarize, CacheStore};
use crate::scrapers::domain_health::read_health_file;
use crate::scrapers::DomainHealthEntry;

/// Show overall system status.
pub async fn cmd_status(settings: &Settings, json: bool) -> anyhow::Result<()> {
    settings.validate()?;
    let now = Utc::now();
    let cache = CacheStore::new(&settings.data_dir);
    let snapshot = cache.load();
    let summary = summarize(&snapshot);
    let stale = is_stale(&snapshot, now, settings.stale_threshold());

    let mut health: Vec<DomainHealthEntry> =
        read_health_file(&settings.health_path()).into_values().collect();
    health.sort_by(|a, b| a.domain.cmp(&b.domain));

    if json {
        let value = json!({
            "data_dir": settings.data_dir,
            "last_write": snapshot.last_write,
            "stale": stale,
            "summary": summary,
            "domains": health,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let separator = "─".repeat(60);
    println!();
    println!(
        "{:<40} {}",
        style("policyscout status").bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}", separator);
    println!("Data Dir: {}", settings.data_dir.display());

    match snapshot.last_write {
        Some(written) => {
            let age = now - written;
            let freshness = if stale {
                style("stale").yellow()
            } else {
                style("fresh").green()
            };
            println!(
                "Cache:    {} records, written {} ({}h {}m ago, {})",
                summary.total,
                written.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                age.num_hours(),
                age.num_minutes() % 60,
                freshness
            );
        }
        None => println!("Cache:    {}", style("empty").yellow()),
    }

    if summary.total > 0 {
        println!();
        println!("{}", style("By category").bold());
        for (category, count) in &summary.by_category {
            println!("  {:<12} {:>5}", category, count);
        }
        println!();
        println!("{}", style("By keyword").bold());
        for (keyword, count) in &summary.by_keyword {
            println!("  {:<20} {:>5}", keyword, count);
        }
    }

    println!();
    println!("{}", style("Domains").bold());
    let table = settings.source_table();
    for domain in &table.domains() {
        let entry = health.iter().find(|e| &e.domain == domain);
        let line = match entry {
            Some(e) if !e.is_available(now) => format!(
                "{} until {} ({} failure, {} total)",
                style("disabled").red(),
                e.disabled_until
                    .map(|u| u.with_timezone(&Local).format("%H:%M").to_string())
                    .unwrap_or_default(),
                e.last_failure.map(|k| k.as_str()).unwrap_or("unknown"),
                e.failure_count
            ),
            Some(e) if e.failure_count > 0 => format!(
                "{} ({} past failures)",
                style("available").green(),
                e.failure_count
            ),
            _ => style("available").green().to_string(),
        };
        let region = table.region_of(domain).unwrap_or("-");
        println!("  {:<28} {:<8} {}", domain, region, line);
    }
    println!("{}", separator);

    Ok(())
}
