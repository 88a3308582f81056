pub mod aggregate;
pub mod dashboard;

pub use aggregate::{aggregate_directory, aggregate_workspace, list_spec_files};

use crate::lint::ScoreResult;
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Verdict for one spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpecStatus {
    Pass,
    Fail,
}

impl SpecStatus {
    /// `score == threshold` passes
    pub fn from_score(score: u32, threshold: u32) -> Self {
        if score >= threshold {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

/// One row of a governance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Spec name
    pub name: String,
    /// Registry id, or file path in directory mode
    pub id: String,
    /// Score from 0 to 100
    pub score: u32,
    pub violations_count: u32,
    pub status: SpecStatus,
    /// Why the spec could not be scored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportEntry {
    /// An entry with an error always fails
    pub fn from_result(
        name: impl Into<String>,
        id: impl Into<String>,
        result: &ScoreResult,
        threshold: u32,
    ) -> Self {
        let status = if result.error.is_some() {
            SpecStatus::Fail
        } else {
            SpecStatus::from_score(result.score, threshold)
        };
        Self {
            name: name.into(),
            id: id.into(),
            score: result.score,
            violations_count: result.violation_count,
            status,
            error: result.error.clone(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == SpecStatus::Pass
    }
}

/// Totals over a report
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub average_score: f64,
}

impl ReportSummary {
    pub fn from_entries(entries: &[ReportEntry]) -> Self {
        let total = entries.len();
        let passed = entries.iter().filter(|e| e.passed()).count();
        let average_score = if total == 0 {
            0.0
        } else {
            entries.iter().map(|e| e.score as f64).sum::<f64>() / total as f64
        };
        Self {
            total,
            passed,
            failed: total - passed,
            average_score,
        }
    }
}

/// Overwrite `path` with the report as pretty JSON
pub fn write_report(path: &Path, entries: &[ReportEntry]) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

pub fn read_report(path: &Path) -> anyhow::Result<Vec<ReportEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid report file {}", path.display()))
}

/// JSON Schema of the report file
pub fn report_schema() -> schemars::Schema {
    schemars::schema_for!(Vec<ReportEntry>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeverityCounts;

    fn entry(name: &str, score: u32, status: SpecStatus) -> ReportEntry {
        ReportEntry {
            name: name.into(),
            id: format!("{}-id", name),
            score,
            violations_count: 0,
            status,
            error: None,
        }
    }

    #[test]
    fn test_status_boundary() {
        assert_eq!(SpecStatus::from_score(70, 70), SpecStatus::Pass);
        assert_eq!(SpecStatus::from_score(69, 70), SpecStatus::Fail);
    }

    #[test]
    fn test_entry_with_error_fails_at_zero_threshold() {
        let result = ScoreResult::failed("couldn't parse");
        let entry = ReportEntry::from_result("pets", "pets.yaml", &result, 0);
        assert_eq!(entry.status, SpecStatus::Fail);
        assert_eq!(entry.score, 0);
    }

    #[test]
    fn test_entry_from_scored_result() {
        let result = ScoreResult::from_violations(SeverityCounts::new(1, 1, 0, 0).to_violations());
        let entry = ReportEntry::from_result("pets", "s1", &result, 70);
        assert_eq!(entry.score, 85);
        assert_eq!(entry.violations_count, 2);
        assert!(entry.passed());
    }

    #[test]
    fn test_summary_of_empty_report() {
        let summary = ReportSummary::from_entries(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_score, 0.0);
    }

    #[test]
    fn test_summary_counts_and_mean() {
        let entries = vec![
            entry("a", 90, SpecStatus::Pass),
            entry("b", 40, SpecStatus::Fail),
            entry("c", 80, SpecStatus::Pass),
        ];
        let summary = ReportSummary::from_entries(&entries);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.average_score, 70.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut failed = entry("b", 0, SpecStatus::Fail);
        failed.error = Some("timeout".into());
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["violationsCount"], 0);
        assert_eq!(value["status"], "FAIL");
        assert_eq!(value["error"], "timeout");
        assert!(serde_json::to_value(entry("a", 90, SpecStatus::Pass)).unwrap()["error"].is_null());
    }

    #[test]
    fn test_report_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut failed = entry("b", 0, SpecStatus::Fail);
        failed.error = Some("linter timed out".into());
        let entries = vec![entry("a", 95, SpecStatus::Pass), failed];

        write_report(&path, &entries).unwrap();
        assert_eq!(read_report(&path).unwrap(), entries);
    }

    #[test]
    fn test_schema_mentions_fields() {
        let schema = serde_json::to_string(&report_schema()).unwrap();
        assert!(schema.contains("violationsCount"));
        assert!(schema.contains("PASS"));
    }
}
