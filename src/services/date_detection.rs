//! Publication date parsing for scraped date text.
//!
//! Listing pages print dates in a handful of shapes, often wrapped in other
//! text ("发布时间：2024年3月5日 10:00"). Parsing is strict about the shape
//! but tolerant about the surroundings. Callers fall back to the crawl date
//! when nothing matches.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Accepted whole-string formats, tried first.
const ACCEPTED_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Patterns for dates embedded in longer text.
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // 2024-03-05, 2024/3/5, 2024.03.05
        r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})",
        // 2024年3月5日
        r"(\d{4})年(\d{1,2})月(\d{1,2})日",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Parse a scraped date string.
///
/// Returns None when no accepted format is found or the date is implausible
/// (before 1990 or more than a year after `today`).
pub fn parse_date_text(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| extract_embedded_date(trimmed))?;

    if parsed.year() < 1990 || parsed.year() > today.year() + 1 {
        return None;
    }
    Some(parsed)
}

/// Parse a date text, defaulting to `today` when it can't be read.
pub fn parse_date_or(text: Option<&str>, today: NaiveDate) -> NaiveDate {
    text.and_then(|t| parse_date_text(t, today)).unwrap_or(today)
}

fn extract_embedded_date(text: &str) -> Option<NaiveDate> {
    DATE_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}
