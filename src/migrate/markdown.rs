//! Heuristic structure extraction from markdown documents.
//!
//! This is deliberately not a markdown parser. It recognizes level-2 headings,
//! record blocks (`## F-001 ...`) and bold-labeled fields (`**Name**: value`).
//!
//! Heading normalization, applied in order:
//! - leading numbering and bullet characters (`1.`, `2.3`, `-`, `、`, `()`) and
//!   leading emoji are stripped, repeatedly, so `1. 📦 Setup` and `📦 Setup` agree
//! - a trailing parenthetical annotation (`(optional)`, `（可选）`) is stripped
//! - inline code backticks are removed
//! - whitespace is collapsed and the result lowercased

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{2,6})\s+(.+)$").expect("static regex"));
static RECORD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+F-\d+").expect("static regex"));
static LABELED_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*(.+?)\*\*").expect("static regex"));
static LEADING_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.\-、()*]+\s*").expect("static regex"));
static LEADING_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{1F300}-\x{1FAFF}\x{2600}-\x{27BF}\x{2B00}-\x{2BFF}\x{FE0F}\x{200D}]+\s*")
        .expect("static regex")
});
static TRAILING_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[（(][^）)]*[）)]\s*$").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

pub fn normalize_heading(text: &str) -> String {
    let mut current = text.trim().to_string();
    loop {
        let stripped = LEADING_NUMBERING.replace(&current, "");
        let stripped = LEADING_EMOJI.replace(&stripped, "").into_owned();
        if stripped == current {
            break;
        }
        current = stripped;
    }
    let current = TRAILING_PARENTHETICAL.replace(&current, "");
    let current = current.replace('`', "");
    WHITESPACE
        .replace_all(&current, " ")
        .trim()
        .to_lowercase()
}

/// Normalized heading texts at the given levels (2..=6). Empty results are dropped.
pub fn extract_headings(content: &str, levels: &[usize]) -> BTreeSet<String> {
    content
        .lines()
        .filter_map(|line| {
            let caps = HEADING.captures(line.trim_end())?;
            let level = caps.get(1)?.as_str().len();
            if !levels.contains(&level) {
                return None;
            }
            let normalized = normalize_heading(caps.get(2)?.as_str());
            (!normalized.is_empty()).then_some(normalized)
        })
        .collect()
}

/// Level-2 headings in document order, normalized, without duplicates.
pub fn ordered_sections(content: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for line in content.lines() {
        let Some(caps) = HEADING.captures(line.trim_end()) else {
            continue;
        };
        if caps[1].len() != 2 {
            continue;
        }
        let normalized = normalize_heading(&caps[2]);
        if !normalized.is_empty() && !seen.contains(&normalized) {
            seen.push(normalized);
        }
    }
    seen
}

pub fn is_record_heading(line: &str) -> bool {
    RECORD_HEADING.is_match(line)
}

/// Every record block, each running from its heading to the next record heading.
pub fn record_blocks(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_record_heading(line))
        .map(|(i, _)| i)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(lines.len());
            lines[start..end].join("\n")
        })
        .collect()
}

/// Labeled field names declared in the first record block, in order of appearance.
pub fn template_record_fields(content: &str) -> Vec<String> {
    let Some(first) = record_blocks(content).into_iter().next() else {
        return Vec::new();
    };
    let mut fields: Vec<String> = Vec::new();
    for line in first.lines() {
        if let Some(caps) = LABELED_FIELD.captures(line) {
            let name = caps[1].trim().to_string();
            if !name.is_empty() && !fields.contains(&name) {
                fields.push(name);
            }
        }
    }
    fields
}

/// Whether `block` declares `**field**`, optionally followed by `:` or `：`.
pub fn block_has_field(block: &str, field: &str) -> bool {
    let pattern = format!(r"(?m)\*\*{}\*\*\s*(：|:)?", regex::escape(field));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(block))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_numbering_emoji_and_annotations() {
        assert_eq!(normalize_heading("1. Overview"), "overview");
        assert_eq!(normalize_heading("📦 Overview"), "overview");
        assert_eq!(normalize_heading("2.3 📦 Overview (optional)"), "overview");
        assert_eq!(normalize_heading("⚙️ `Build`   Steps"), "build steps");
        assert_eq!(normalize_heading("7. 环境配置（可选）"), "环境配置");
        assert_eq!(normalize_heading("- Tech Stack"), "tech stack");
    }

    #[test]
    fn extract_headings_filters_by_level() {
        let content = "# Title\n## 1. Goals\n### Detail\n## Scope\n";
        let h2 = extract_headings(content, &[2]);
        assert_eq!(h2.into_iter().collect::<Vec<_>>(), vec!["goals", "scope"]);
        let h3 = extract_headings(content, &[3]);
        assert!(h3.contains("detail"));
    }

    #[test]
    fn ordered_sections_preserve_document_order() {
        let content = "## Zeta\n## Alpha\n## 1. Zeta\n";
        assert_eq!(ordered_sections(content), vec!["zeta", "alpha"]);
    }

    #[test]
    fn record_blocks_split_on_record_headings() {
        let content = "# Features\n\n## F-001 ✅ Login\n**Status**: done\n\n## F-002 Signup\n**Status**: todo\n";
        let blocks = record_blocks(content);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("## F-001"));
        assert!(blocks[0].contains("done"));
        assert!(blocks[1].starts_with("## F-002"));
    }

    #[test]
    fn template_fields_come_from_first_block_only() {
        let content = "## F-001 Sample\n**Description**: x\n**Priority**: P1\n\n## F-002 Other\n**Extra**: y\n";
        assert_eq!(template_record_fields(content), vec!["Description", "Priority"]);
        assert!(template_record_fields("## Not a record\n**A**: b").is_empty());
    }

    #[test]
    fn field_match_tolerates_separators() {
        assert!(block_has_field("**Priority**: P1", "Priority"));
        assert!(block_has_field("**优先级**：P1", "优先级"));
        assert!(block_has_field("**Priority** P1", "Priority"));
        assert!(!block_has_field("Priority: P1", "Priority"));
        assert!(block_has_field("**a.b**", "a.b"));
        assert!(!block_has_field("**axb**", "a.b"));
    }
}
