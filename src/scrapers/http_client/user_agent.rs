//! User agent selection.

use rand::seq::IndexedRandom;

const DEFAULT_AGENT: &str =
    "policyscout/0.1 (policy monitoring; github.com/monokrome/policyscout)";

/// Config value that selects a browser agent instead of ours.
const IMPERSONATE: &str = "impersonate";

/// Desktop browser agents. Many government portals reject unfamiliar agents.
const BROWSER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// Agent string for a configured value: ours when unset or blank, a random
/// browser agent for `impersonate`, otherwise the value itself.
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim).filter(|s| !s.is_empty()) {
        None => DEFAULT_AGENT.to_string(),
        Some(IMPERSONATE) => BROWSER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(DEFAULT_AGENT)
            .to_string(),
        Some(custom) => custom.to_string(),
    }
}
