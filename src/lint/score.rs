use super::parser::{self, ParseOutcome};
use crate::types::{Severity, Violation};
use serde::{Deserialize, Serialize};

/// Score of a spec with no violations
pub const MAX_SCORE: u32 = 100;

pub const ERROR_PENALTY: u32 = 10;
pub const WARNING_PENALTY: u32 = 5;
pub const INFO_PENALTY: u32 = 2;
pub const HINT_PENALTY: u32 = 1;

/// Points deducted for one violation of the given severity
pub fn penalty(severity: Severity) -> u32 {
    match severity {
        Severity::Error => ERROR_PENALTY,
        Severity::Warning => WARNING_PENALTY,
        Severity::Info => INFO_PENALTY,
        Severity::Hint => HINT_PENALTY,
    }
}

/// `max(0, 100 - sum of penalties)`
pub fn score(violations: &[Violation]) -> u32 {
    let deducted = violations
        .iter()
        .fold(0u32, |acc, v| acc.saturating_add(penalty(v.severity)));
    MAX_SCORE.saturating_sub(deducted)
}

/// Outcome of scoring one linter run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: u32,
    pub violation_count: u32,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreResult {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            score: score(&violations),
            violation_count: violations.len() as u32,
            violations,
            error: None,
        }
    }

    /// Zero score carrying the reason the spec could not be scored
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            score: 0,
            violation_count: 0,
            violations: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn from_outcome(outcome: ParseOutcome) -> Self {
        match outcome {
            ParseOutcome::ParseFailure(reason) => Self::failed(reason),
            other => Self::from_violations(
                other
                    .counts()
                    .map(|c| c.to_violations())
                    .unwrap_or_default(),
            ),
        }
    }

    /// A result with an error never passes, whatever the threshold
    pub fn passes(&self, threshold: u32) -> bool {
        self.error.is_none() && self.score >= threshold
    }
}

/// Parse and score raw linter output in one step
pub fn score_output(raw: &str) -> ScoreResult {
    ScoreResult::from_outcome(parser::parse(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeverityCounts;

    #[test]
    fn test_empty_is_perfect() {
        assert_eq!(score(&[]), MAX_SCORE);
    }

    #[test]
    fn test_penalties_per_severity() {
        let violations = SeverityCounts::new(2, 3, 4, 3).to_violations();
        assert_eq!(score(&violations), 100 - 20 - 15 - 8 - 3);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let violations = SeverityCounts::new(11, 0, 0, 0).to_violations();
        assert_eq!(score(&violations), 0);
        let violations = SeverityCounts::new(0, 0, 0, 250).to_violations();
        assert_eq!(score(&violations), 0);
    }

    #[test]
    fn test_score_is_order_independent() {
        let mut violations = SeverityCounts::new(1, 2, 3, 4).to_violations();
        let forward = score(&violations);
        violations.reverse();
        assert_eq!(score(&violations), forward);
    }

    #[test]
    fn test_score_matches_formula_across_mixes() {
        for (e, w, i, h) in [(0, 0, 0, 0), (1, 1, 1, 1), (5, 5, 5, 5), (9, 0, 0, 9), (0, 20, 0, 0)] {
            let violations = SeverityCounts::new(e, w, i, h).to_violations();
            let expected = 100i64 - (e * 10 + w * 5 + i * 2 + h) as i64;
            assert_eq!(score(&violations) as i64, expected.max(0));
        }
    }

    #[test]
    fn test_score_output_from_summary() {
        let result = score_output("12 problems (2 errors, 3 warnings, 4 infos, 3 hints)");
        assert_eq!(result.score, 54);
        assert_eq!(result.violation_count, 12);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_score_output_parse_failure_is_zero() {
        let result = score_output("Error: couldn't parse spec at line 3\n[{\"severity\":\"hint\"}]");
        assert_eq!(result.score, 0);
        assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert!(!result.passes(0));
    }

    #[test]
    fn test_threshold_boundary_passes() {
        let result = ScoreResult::from_violations(SeverityCounts::new(3, 0, 0, 0).to_violations());
        assert_eq!(result.score, 70);
        assert!(result.passes(70));
        assert!(!result.passes(71));
    }
}
