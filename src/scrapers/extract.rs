//! Turn a fetched results page into normalized records.
//!
//! Extraction is best effort: a candidate missing a title or summary gets a
//! placeholder, a candidate without a usable link is dropped, and a page that
//! matches nothing simply yields no records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::models::Record;
use crate::services::categorize::categorize;
use crate::services::date_detection::parse_date_or;
use crate::sources::{ExtractionRules, SourceConfig};
use crate::utils::{collapse_whitespace, truncate_chars};

/// Summaries longer than this are cut.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Length of the title prefix compared by [`dedupe_batch`].
pub const TITLE_DEDUPE_CHARS: usize = 50;

struct CompiledRules {
    item: Selector,
    title: Selector,
    link: Selector,
    date: Selector,
    summary: Selector,
    anchor: Selector,
}

impl CompiledRules {
    fn compile(rules: &ExtractionRules) -> Option<Self> {
        let parse = |name: &str, s: &str| match Selector::parse(s) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warn!("Invalid {} selector {:?}: {}", name, s, e);
                None
            }
        };
        Some(Self {
            item: parse("item", &rules.item_selector)?,
            title: parse("title", &rules.title_selector)?,
            link: parse("link", &rules.link_selector)?,
            date: parse("date", &rules.date_selector)?,
            summary: parse("summary", &rules.summary_selector)?,
            anchor: parse("anchor", "a")?,
        })
    }
}

/// Resolve an href against a base URL. Only http(s) results are accepted.
pub fn resolve_link(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => Url::parse(base_url).ok()?.join(href).ok()?,
    };
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

fn first_text(scope: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

/// Extract up to `cap` records from a results page.
pub fn extract_records(
    html: &str,
    keyword: &str,
    source: &SourceConfig,
    crawled_at: DateTime<Utc>,
    cap: usize,
) -> Vec<Record> {
    let Some(rules) = CompiledRules::compile(&source.rules) else {
        warn!("Source {} has invalid extraction rules", source.domain);
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let today = crawled_at.date_naive();
    let mut records = Vec::new();

    for candidate in document.select(&rules.item).take(cap) {
        let link = candidate
            .select(&rules.link)
            .find_map(|el| el.value().attr("href"))
            .and_then(|href| resolve_link(&source.base_url, href));
        let Some(url) = link else {
            debug!("Dropping candidate without usable link on {}", source.domain);
            continue;
        };

        let title = first_text(&candidate, &rules.title)
            .or_else(|| first_text(&candidate, &rules.anchor))
            .unwrap_or_else(|| format!("{}相关政策动态 - {}", keyword, source.domain));

        let date_text = first_text(&candidate, &rules.date);
        let publish_date = parse_date_or(date_text.as_deref(), today);

        let summary = match first_text(&candidate, &rules.summary) {
            Some(text) => truncate_chars(&text, SUMMARY_MAX_CHARS),
            None => format!("关于{}的最新政策动态，来源：{}", keyword, source.domain),
        };

        records.push(Record {
            id: Record::compute_id(&source.domain, Some(&url)),
            category: categorize(keyword, &title),
            title,
            summary,
            url,
            source_domain: source.domain.clone(),
            publish_date,
            keyword: keyword.to_string(),
            crawled_at,
            region: source.region.clone(),
            is_fallback: false,
        });
    }

    records
}

/// Drop records whose title prefix repeats an earlier one in the same batch.
pub fn dedupe_batch(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let prefix: String = r.title.chars().take(TITLE_DEDUPE_CHARS).collect();
            seen.insert(prefix)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::sources::SourceTier;
    use chrono::{NaiveDate, TimeZone};

    fn source() -> SourceConfig {
        SourceConfig {
            domain: "moa.gov.cn".to_string(),
            base_url: "https://www.moa.gov.cn/search/".to_string(),
            search_url_template: "https://www.moa.gov.cn/search?q={keyword}".to_string(),
            tier: SourceTier::Official,
            region: Some("全国".to_string()),
            rules: ExtractionRules {
                item_selector: "li.item".to_string(),
                title_selector: "h3".to_string(),
                link_selector: "a[href]".to_string(),
                date_selector: "span.date".to_string(),
                summary_selector: "p".to_string(),
            },
        }
    }

    fn crawled_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_extracts_full_candidate() {
        let html = r#"<ul>
            <li class="item">
                <h3>关于做好2025年渔业保险工作的通知</h3>
                <a href="/zwgk/2025/notice.html">详情</a>
                <span class="date">2025年5月20日</span>
                <p>  各省渔业主管部门：
                    为推进渔业保险…  </p>
            </li>
        </ul>"#;

        let records = extract_records(html, "渔业保险", &source(), crawled_at(), 5);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "关于做好2025年渔业保险工作的通知");
        assert_eq!(r.url, "https://www.moa.gov.cn/zwgk/2025/notice.html");
        assert_eq!(r.publish_date, NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
        assert_eq!(r.summary, "各省渔业主管部门： 为推进渔业保险…");
        assert_eq!(r.category, Category::Funding);
        assert_eq!(r.region.as_deref(), Some("全国"));
        assert_eq!(r.id, Record::compute_id("moa.gov.cn", Some(&r.url)));
        assert!(!r.is_fallback);
    }

    #[test]
    fn test_placeholders_and_default_date() {
        let html = r#"<ul><li class="item"><a href="https://www.moa.gov.cn/a.html"></a></li></ul>"#;
        let records = extract_records(html, "海洋牧场", &source(), crawled_at(), 5);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "海洋牧场相关政策动态 - moa.gov.cn");
        assert_eq!(records[0].summary, "关于海洋牧场的最新政策动态，来源：moa.gov.cn");
        assert_eq!(records[0].publish_date, crawled_at().date_naive());
    }

    #[test]
    fn test_title_falls_back_to_anchor_text() {
        let html = r#"<ul><li class="item"><a href="/x.html">渔港建设管理办法</a></li></ul>"#;
        let records = extract_records(html, "渔港建设", &source(), crawled_at(), 5);
        assert_eq!(records[0].title, "渔港建设管理办法");
    }

    #[test]
    fn test_unusable_links_drop_candidate() {
        let html = r#"<ul>
            <li class="item"><h3>No link</h3></li>
            <li class="item"><h3>Script</h3><a href="javascript:void(0)">x</a></li>
            <li class="item"><h3>Mail</h3><a href="mailto:a@b.cn">x</a></li>
            <li class="item"><h3>Good</h3><a href="ok.html">x</a></li>
        </ul>"#;
        let records = extract_records(html, "渔业政策", &source(), crawled_at(), 5);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://www.moa.gov.cn/search/ok.html");
    }

    #[test]
    fn test_cap_limits_candidates() {
        let items: String = (0..10)
            .map(|i| format!(r#"<li class="item"><h3>标题{i}</h3><a href="/{i}.html">x</a></li>"#))
            .collect();
        let html = format!("<ul>{}</ul>", items);
        let records = extract_records(&html, "渔业政策", &source(), crawled_at(), 5);
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_long_summary_truncated() {
        let long = "长".repeat(300);
        let html = format!(
            r#"<ul><li class="item"><a href="/a.html">t</a><p>{}</p></li></ul>"#,
            long
        );
        let records = extract_records(&html, "渔业政策", &source(), crawled_at(), 5);
        assert_eq!(records[0].summary.chars().count(), SUMMARY_MAX_CHARS + 3);
        assert!(records[0].summary.ends_with("..."));
    }

    #[test]
    fn test_invalid_selector_yields_nothing() {
        let mut src = source();
        src.rules.item_selector = "li[".to_string();
        let html = r#"<ul><li class="item"><a href="/a.html">t</a></li></ul>"#;
        assert!(extract_records(html, "渔业政策", &src, crawled_at(), 5).is_empty());
    }

    #[test]
    fn test_garbage_input_yields_nothing() {
        assert!(extract_records("", "渔业政策", &source(), crawled_at(), 5).is_empty());
        assert!(extract_records("<<<>>>", "渔业政策", &source(), crawled_at(), 5).is_empty());
    }

    #[test]
    fn test_dedupe_batch_by_title_prefix() {
        let html = r#"<ul>
            <li class="item"><h3>渔业保险通知</h3><a href="/a.html">x</a></li>
            <li class="item"><h3>渔业保险通知</h3><a href="/b.html">x</a></li>
            <li class="item"><h3>另一条</h3><a href="/c.html">x</a></li>
        </ul>"#;
        let records = extract_records(html, "渔业保险", &source(), crawled_at(), 5);
        let deduped = dedupe_batch(records);
        assert_eq!(deduped.len(), 2);
        assert!(deduped[0].url.ends_with("/a.html"));
    }

    #[test]
    fn test_placeholder_titles_survive_dedupe_across_domains() {
        let html = r#"<ul><li class="item"><a href="/x1.html"><img src="i.png"></a></li></ul>"#;
        let mut other = source();
        other.domain = "b.gov.cn".to_string();
        other.base_url = "https://b.gov.cn".to_string();

        let mut batch = extract_records(html, "渔业保险", &source(), crawled_at(), 5);
        batch.extend(extract_records(html, "渔业保险", &other, crawled_at(), 5));
        let deduped = dedupe_batch(batch);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].url, "https://www.moa.gov.cn/x1.html");
        assert_eq!(deduped[1].url, "https://b.gov.cn/x1.html");
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("https://a.cn/x/", "../y.html").as_deref(),
            Some("https://a.cn/y.html")
        );
        assert_eq!(
            resolve_link("https://a.cn", "http://b.cn/z").as_deref(),
            Some("http://b.cn/z")
        );
        assert_eq!(resolve_link("https://a.cn", "#top"), None);
        assert_eq!(resolve_link("not a url", "/relative"), None);
    }
}
