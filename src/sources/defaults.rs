//! Built-in keyword list and source table, used when the config file supplies none.

use super::{ExtractionRules, SourceConfig, SourceTier};

const DEFAULT_KEYWORDS: &[&str] = &[
    // Inland aquaculture
    "池塘养殖",
    "循环水养殖",
    "稻渔综合种养",
    "养殖尾水处理",
    // Marine fisheries
    "海洋牧场",
    "人工鱼礁",
    "休渔期政策",
    "深海养殖",
    // Ports and facilities
    "渔港建设",
    "渔船管理",
    // Greenhouse cultivation
    "设施农业",
    "智能大棚",
    "水肥一体化",
    // Technology
    "渔业物联网",
    "水质传感器",
    "精准投喂",
    // Policy and funding
    "渔业政策",
    "渔业保险",
    "渔业发展专项资金",
    "设施农业补贴",
    "碳汇渔业",
];

/// Default keyword list.
pub fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn source(
    domain: &str,
    base_url: &str,
    search_url_template: &str,
    tier: SourceTier,
    region: Option<&str>,
    rules: ExtractionRules,
) -> SourceConfig {
    SourceConfig {
        domain: domain.to_string(),
        base_url: base_url.to_string(),
        search_url_template: search_url_template.to_string(),
        tier,
        region: region.map(|r| r.to_string()),
        rules,
    }
}

/// Default source table.
pub fn default_sources() -> Vec<SourceConfig> {
    let gov_rules = ExtractionRules {
        item_selector: "div.result-item, li.result".to_string(),
        title_selector: "h3 a, a.title".to_string(),
        link_selector: "a[href]".to_string(),
        date_selector: "span.date, .pubtime".to_string(),
        summary_selector: "p.summary, p".to_string(),
    };
    let media_rules = ExtractionRules {
        item_selector: "div.news-item, li.news".to_string(),
        title_selector: "h3, a".to_string(),
        link_selector: "a[href]".to_string(),
        date_selector: "span.time, .date".to_string(),
        summary_selector: "p.abs, p".to_string(),
    };

    vec![
        source(
            "moa.gov.cn",
            "https://www.moa.gov.cn",
            "https://www.moa.gov.cn/was5/web/search?searchword={keyword}",
            SourceTier::Official,
            None,
            gov_rules.clone(),
        ),
        source(
            "agri.gov.cn",
            "https://www.agri.gov.cn",
            "https://www.agri.gov.cn/search?q={keyword}",
            SourceTier::Official,
            None,
            gov_rules.clone(),
        ),
        source(
            "scsf.gd.gov.cn",
            "https://scsf.gd.gov.cn",
            "https://scsf.gd.gov.cn/search?keywords={keyword}",
            SourceTier::Official,
            Some("广东"),
            gov_rules.clone(),
        ),
        source(
            "nynct.zj.gov.cn",
            "https://nynct.zj.gov.cn",
            "https://nynct.zj.gov.cn/search?q={keyword}",
            SourceTier::Official,
            Some("浙江"),
            gov_rules,
        ),
        source(
            "people.com.cn",
            "http://search.people.cn",
            "http://search.people.cn/search?keyword={keyword}",
            SourceTier::Media,
            None,
            media_rules.clone(),
        ),
        source(
            "chinafisherynews.com.cn",
            "http://www.chinafisherynews.com.cn",
            "http://www.chinafisherynews.com.cn/search?q={keyword}",
            SourceTier::Media,
            None,
            media_rules,
        ),
        source(
            "fishxun.com",
            "https://www.fishxun.com",
            "https://www.fishxun.com/search?q={keyword}",
            SourceTier::Industry,
            None,
            ExtractionRules::default(),
        ),
    ]
}
