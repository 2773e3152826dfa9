//! Keyword/title heuristics for record categories.

use crate::models::Category;

/// Funding terms, checked first.
const FUNDING_TERMS: &[&str] = &[
    "资金", "补贴", "补助", "贷款", "保险", "奖补", "专项", "申报", "补偿", "扶持",
];

/// Technology terms, checked second.
const TECHNOLOGY_TERMS: &[&str] = &[
    "技术", "智能", "物联网", "传感器", "大数据", "机器人", "遥感", "无人机", "育种", "基因",
    "疫苗", "自动化", "监测", "识别", "LED", "CO2", "模型", "栽培",
];

/// Generic policy terms, checked last.
const POLICY_TERMS: &[&str] = &[
    "政策", "规划", "通知", "办法", "意见", "条例", "规定", "方案", "管理", "标准", "法规",
];

/// Ordered rule sets; the first set with a matching term decides.
const RULES: &[(Category, &[&str])] = &[
    (Category::Funding, FUNDING_TERMS),
    (Category::Technology, TECHNOLOGY_TERMS),
    (Category::Policy, POLICY_TERMS),
];

/// Derive a category from the query keyword and the record title.
pub fn categorize(keyword: &str, title: &str) -> Category {
    for (category, terms) in RULES {
        if terms
            .iter()
            .any(|term| keyword.contains(term) || title.contains(term))
        {
            return *category;
        }
    }
    Category::Other
}

/// Whether a title reads as policy or funding content.
pub fn mentions_policy_or_funding(title: &str) -> bool {
    POLICY_TERMS
        .iter()
        .chain(FUNDING_TERMS.iter())
        .any(|term| title.contains(term))
}
