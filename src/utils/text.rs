//! Text cleanup helpers for scraped content.

/// Collapse runs of whitespace (including full-width spaces) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{3000}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to at most `max` characters, appending `...` when cut.
///
/// Counts chars, not bytes, so CJK text is never split mid-codepoint.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("渔业\u{3000}\u{3000}保险"), "渔业 保险");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("渔业保险政策", 4), "渔业保险...");
        assert_eq!(truncate_chars("abcd", 4), "abcd");
    }
}
