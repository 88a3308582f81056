//! Turns raw linter output into severity counts.
//!
//! The linter prints different shapes depending on version and flags: a
//! colored text report ending in a summary line, a JSON document, or a
//! rendered table. Each shape has its own tier below, tried in a fixed order
//! by [`parse`].

use crate::types::{Severity, SeverityCounts};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::trace;

/// Markers the linter prints when the spec itself could not be read
const PARSE_FAILURE_MARKERS: [&str; 2] = ["couldn't parse", "could not parse"];

/// Column separators used by ASCII and box-drawing tables
const TABLE_SEPARATORS: [char; 2] = ['|', '│'];

/// Keywords checked, in order, when no table cell names a severity
const ROW_KEYWORDS: [(&str, Severity); 4] = [
    ("ERROR", Severity::Error),
    ("WARN", Severity::Warning),
    ("INFO", Severity::Info),
    ("HINT", Severity::Hint),
];

/// Which tier recognised the output, with what it found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Summary(SeverityCounts),
    StructuredJson(SeverityCounts),
    TableRows(SeverityCounts),
    ParseFailure(String),
}

impl ParseOutcome {
    pub fn counts(&self) -> Option<SeverityCounts> {
        match self {
            Self::Summary(c) | Self::StructuredJson(c) | Self::TableRows(c) => Some(*c),
            Self::ParseFailure(_) => None,
        }
    }

    pub fn tier(&self) -> &'static str {
        match self {
            Self::Summary(_) => "summary",
            Self::StructuredJson(_) => "json",
            Self::TableRows(_) => "table",
            Self::ParseFailure(_) => "parse-failure",
        }
    }
}

/// Parse raw linter output
pub fn parse(raw: &str) -> ParseOutcome {
    let cleaned = strip_ansi(raw);

    let outcome = if let Some(reason) = detect_parse_failure(&cleaned) {
        ParseOutcome::ParseFailure(reason)
    } else if let Some(counts) = parse_summary(&cleaned) {
        ParseOutcome::Summary(counts)
    } else if let Some(counts) = parse_json(&cleaned) {
        ParseOutcome::StructuredJson(counts)
    } else {
        ParseOutcome::TableRows(parse_table(&cleaned))
    };
    trace!(
        "Linter output parsed by {} tier ({} findings)",
        outcome.tier(),
        outcome.counts().map(|c| c.total()).unwrap_or_default()
    );
    outcome
}

fn ansi_regex() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("valid regex"))
}

fn summary_regex() -> &'static Regex {
    static SUMMARY: OnceLock<Regex> = OnceLock::new();
    SUMMARY.get_or_init(|| {
        Regex::new(
            r"(?i)(\d+)\s+problems?\s*\(\s*(\d+)\s+errors?\s*,\s*(\d+)\s+warnings?\s*,\s*(\d+)\s+infos?\s*,\s*(\d+)\s+hints?\s*\)",
        )
        .expect("valid regex")
    })
}

/// Remove terminal color and cursor escape sequences
pub fn strip_ansi(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Return a description if the linter reports that it could not read the spec
pub fn detect_parse_failure(text: &str) -> Option<String> {
    text.lines()
        .find(|line| {
            let lower = line.to_lowercase();
            PARSE_FAILURE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .map(|line| format!("Invalid specification: {}", line.trim()))
}

/// Read counts from a `N problems (E errors, W warnings, I infos, H hints)` line
pub fn parse_summary(text: &str) -> Option<SeverityCounts> {
    let caps = summary_regex().captures(text)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    Some(SeverityCounts::new(num(2)?, num(3)?, num(4)?, num(5)?))
}

/// Count results in a JSON array, either top-level or under `results`
pub fn parse_json(text: &str) -> Option<SeverityCounts> {
    let value = parse_json_value(text)?;
    let items = violation_items(&value)?;

    Some(
        items
            .iter()
            .filter_map(Value::as_object)
            .map(|obj| obj.get("severity").and_then(severity_of).unwrap_or(Severity::Hint))
            .collect(),
    )
}

fn violation_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("results")
            .or_else(|| map.get("violations"))
            .and_then(Value::as_array),
        _ => None,
    }
}

/// Parse the whole text, or failing that a document embedded after a banner.
///
/// An embedded document must open at the start of a line and look like a
/// violation list, so bracketed fragments inside table cells (`tags[0]`, `[]`)
/// never shadow the table tier.
fn parse_json_value(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let start = document_start(trimmed)?;
    let end = trimmed.rfind(['}', ']'])?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&trimmed[start..=end]).ok()?;
    is_violation_document(&value).then_some(value)
}

/// Byte offset of the first line whose first non-blank character opens a JSON document
fn document_start(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_start();
        if content.starts_with(['{', '[']) {
            return Some(offset + line.len() - content.len());
        }
        offset += line.len();
    }
    None
}

fn is_violation_document(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        Value::Object(map) => ["results", "violations"]
            .iter()
            .any(|key| map.get(*key).is_some_and(Value::is_array)),
        _ => false,
    }
}

fn severity_of(value: &Value) -> Option<Severity> {
    match value {
        Value::String(s) => Severity::from_label(s),
        Value::Number(n) => n.as_u64().and_then(Severity::from_level),
        _ => None,
    }
}

/// Count table rows by severity, skipping headers, separators and rows without one
pub fn parse_table(text: &str) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for line in text.lines() {
        if !line.contains(TABLE_SEPARATORS) {
            continue;
        }
        let cells: Vec<&str> = line
            .split(TABLE_SEPARATORS)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if cells.is_empty() || cells.iter().any(|c| c.eq_ignore_ascii_case("severity")) {
            continue;
        }
        if let Some(severity) = classify_row(&cells, line) {
            counts.add(severity);
        }
    }
    counts
}

fn classify_row(cells: &[&str], line: &str) -> Option<Severity> {
    cells
        .iter()
        .find_map(|cell| Severity::from_label(cell))
        .or_else(|| {
            let upper = line.to_uppercase();
            ROW_KEYWORDS
                .iter()
                .find(|(keyword, _)| upper.contains(keyword))
                .map(|(_, severity)| *severity)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        let colored = "\x1b[31merror\x1b[0m \x1b[1;33mwarn\x1b[39m";
        assert_eq!(strip_ansi(colored), "error warn");
    }

    #[test]
    fn test_summary_line() {
        let out = "\x1b[31m✖ 12 problems (2 errors, 3 warnings, 4 infos, 3 hints)\x1b[0m";
        assert_eq!(
            parse(out),
            ParseOutcome::Summary(SeverityCounts::new(2, 3, 4, 3))
        );
    }

    #[test]
    fn test_summary_singular_nouns() {
        let out = "1 problem (1 error, 0 warnings, 0 infos, 0 hints)";
        assert_eq!(parse_summary(out), Some(SeverityCounts::new(1, 0, 0, 0)));
    }

    #[test]
    fn test_summary_wins_over_table() {
        let out = "\
| 1:1 | error | info-contact |
| 2:1 | error | info-license |
3 problems (0 errors, 0 warnings, 3 infos, 0 hints)";
        assert_eq!(
            parse(out),
            ParseOutcome::Summary(SeverityCounts::new(0, 0, 3, 0))
        );
    }

    #[test]
    fn test_json_top_level_array() {
        let out = r#"[{"severity":"ERROR"},{"severity":"warn"},{"severity":1},{"code":"x"}]"#;
        assert_eq!(
            parse(out),
            ParseOutcome::StructuredJson(SeverityCounts::new(1, 2, 0, 1))
        );
    }

    #[test]
    fn test_json_results_key() {
        let out = r#"{"results":[{"severity":"info"},{"severity":"Hint"}],"total":2}"#;
        assert_eq!(parse_json(out), Some(SeverityCounts::new(0, 0, 1, 1)));
    }

    #[test]
    fn test_json_with_banner() {
        let out = "Linting spec...\n{\"results\":[{\"severity\":\"error\"}]}\n";
        assert_eq!(parse_json(out), Some(SeverityCounts::new(1, 0, 0, 0)));
    }

    #[test]
    fn test_embedded_array_with_banner() {
        let out = "Linting 1 spec\n  [{\"severity\": 0}, {\"severity\": \"hint\"}]\nDone";
        assert_eq!(parse_json(out), Some(SeverityCounts::new(1, 0, 0, 1)));
    }

    #[test]
    fn test_bracketed_path_in_table_is_not_json() {
        let out = "\
│ Line │ Severity │ Path │
│ 3:1 │ error │ paths./pets.get.tags[0] │
│ 9:5 │ error │ Operation must have summary │";
        assert_eq!(parse_json(out), None);
        assert_eq!(
            parse(out),
            ParseOutcome::TableRows(SeverityCounts::new(2, 0, 0, 0))
        );
    }

    #[test]
    fn test_empty_brackets_in_message_are_not_json() {
        let out = "| 4:2 | error | tags must not be [] |";
        assert_eq!(
            parse(out),
            ParseOutcome::TableRows(SeverityCounts::new(1, 0, 0, 0))
        );
    }

    #[test]
    fn test_embedded_scalar_array_is_rejected() {
        let out = "Checked rules\n[1, 2, 3]\nwarning: deprecated flag";
        assert_eq!(parse_json(out), None);
    }

    #[test]
    fn test_json_object_without_results_is_not_structured() {
        assert_eq!(parse_json(r#"{"status":"ok"}"#), None);
    }

    #[test]
    fn test_table_rows() {
        let out = "\
┌──────┬──────────┬────────────────────────────────────┐
│ Line │ Severity │ Message                            │
├──────┼──────────┼────────────────────────────────────┤
│ 3:1  │ warning  │ Operation must have error response │
│ 9:5  │ error    │ Path must not end with slash       │
│ 12:1 │ hint     │ Tag has no description             │
└──────┴──────────┴────────────────────────────────────┘";
        assert_eq!(
            parse(out),
            ParseOutcome::TableRows(SeverityCounts::new(1, 1, 0, 1))
        );
    }

    #[test]
    fn test_table_keyword_fallback() {
        let out = "| 4:2 | [WARN] missing summary |\n| ---- | ---- |";
        assert_eq!(parse_table(out), SeverityCounts::new(0, 1, 0, 0));
    }

    #[test]
    fn test_plain_text_without_rows_counts_nothing() {
        assert_eq!(
            parse("No problems found"),
            ParseOutcome::TableRows(SeverityCounts::default())
        );
    }

    #[test]
    fn test_parse_failure_short_circuits() {
        let out = "Couldn't parse the spec: unexpected token\n5 problems (5 errors, 0 warnings, 0 infos, 0 hints)";
        match parse(out) {
            ParseOutcome::ParseFailure(reason) => assert!(reason.contains("unexpected token")),
            other => panic!("expected parse failure, got {:?}", other),
        }
    }
}
