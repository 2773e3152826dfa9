//! Harvest command: run one collection cycle.

use console::style;

use crate::config::Settings;
use crate::services::{HarvestOutcome, HarvestStage, Harvester};

/// Run the cascade once and report what happened.
pub async fn cmd_harvest(settings: Settings, full_refresh: bool, json: bool) -> anyhow::Result<()> {
    let harvester = Harvester::from_settings(settings).await?;

    if !json {
        println!(
            "{} Collecting policy records{}",
            style("→").cyan(),
            if full_refresh { " (full refresh)" } else { "" }
        );
    }

    let outcome = harvester.run(full_refresh).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

pub(super) fn print_outcome(outcome: &HarvestOutcome) {
    let marker = match outcome.stage {
        HarvestStage::CacheFresh | HarvestStage::Primary => style("✓").green(),
        HarvestStage::Secondary => style("~").yellow(),
        HarvestStage::StaleCache | HarvestStage::Stub => style("!").red(),
    };
    println!(
        "  {} {} records from {}",
        marker,
        outcome.records.len(),
        style(outcome.stage).bold()
    );

    if let Some(report) = &outcome.report {
        println!(
            "  {} tasks: {} succeeded, {} transient, {} terminal",
            style("·").dim(),
            report.succeeded,
            report.transient_failures,
            report.terminal_failures
        );
        if !report.failed_domains.is_empty() {
            let domains: Vec<&str> = report.failed_domains.iter().map(|s| s.as_str()).collect();
            println!("  {} failing: {}", style("·").dim(), domains.join(", "));
        }
    }

    if outcome.stage.is_degraded() {
        println!(
            "  {} Sources are unavailable; results may be outdated",
            style("!").yellow()
        );
    }
}
