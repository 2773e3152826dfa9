//! Query command: filter collected records.

use console::style;

use crate::config::Settings;
use crate::models::{Category, Record};
use crate::repository::CacheStore;
use crate::services::{find_by_id, Harvester, RecordFilter};
use crate::utils::truncate_chars;

pub struct QueryArgs {
    pub category: Option<String>,
    pub region: Option<String>,
    pub keyword: Option<String>,
    pub id: Option<String>,
    pub limit: usize,
    pub offline: bool,
    pub json: bool,
}

pub async fn cmd_query(settings: Settings, args: QueryArgs) -> anyhow::Result<()> {
    let category = match args.category.as_deref() {
        Some(name) => Some(Category::from_str(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown category '{}' (expected policy, funding, technology or other)",
                name
            )
        })?),
        None => None,
    };

    let records = if args.offline {
        CacheStore::new(&settings.data_dir).load().records
    } else {
        let harvester = Harvester::from_settings(settings).await?;
        let outcome = harvester.run(false).await?;
        if outcome.stage.is_degraded() && !args.json {
            eprintln!(
                "{} Serving {} data; sources are unavailable",
                style("!").yellow(),
                outcome.stage
            );
        }
        outcome.records
    };

    if let Some(id) = args.id.as_deref() {
        let record = find_by_id(&records, id)
            .ok_or_else(|| anyhow::anyhow!("No record with id '{}'", id))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(record)?);
        } else {
            print_detail(record);
        }
        return Ok(());
    }

    let filter = RecordFilter {
        category,
        region: args.region,
        keyword: args.keyword,
    };
    let mut matched = filter.apply(&records);
    let total = matched.len();
    if args.limit > 0 {
        matched.truncate(args.limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matched)?);
        return Ok(());
    }

    if matched.is_empty() {
        println!("{} No matching records", style("!").yellow());
        return Ok(());
    }

    for record in &matched {
        print_row(record);
    }
    if total > matched.len() {
        println!(
            "{}",
            style(format!("… {} more (use --limit 0 to show all)", total - matched.len())).dim()
        );
    }
    Ok(())
}

fn print_row(record: &Record) {
    let title = if record.is_fallback {
        style(record.title.as_str()).red().to_string()
    } else {
        record.title.clone()
    };
    println!(
        "{} {:<10} {} {}",
        style(record.publish_date).dim(),
        style(record.category).cyan(),
        title,
        style(format!("[{}]", record.source_domain)).dim()
    );
}

fn print_detail(record: &Record) {
    println!("{}", style(&record.title).bold());
    println!("  id:        {}", record.id);
    println!("  url:       {}", record.url);
    println!("  source:    {}", record.source_domain);
    println!("  published: {}", record.publish_date);
    println!("  category:  {}", record.category);
    println!("  keyword:   {}", record.keyword);
    if let Some(region) = &record.region {
        println!("  region:    {}", region);
    }
    println!();
    println!("  {}", truncate_chars(&record.summary, 400));
}
