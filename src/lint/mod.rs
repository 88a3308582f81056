pub mod parser;
pub mod runner;
pub mod score;

pub use runner::{CliLinter, LintTarget, Linter, OutputFormat};
pub use score::ScoreResult;

use tracing::{debug, warn};

/// Lint one target and score it, turning any failure into a zero-score result
pub async fn lint_and_score<L: Linter>(linter: &L, target: &LintTarget) -> ScoreResult {
    match linter.lint(target).await {
        Ok(output) => {
            let result = score::score_output(&output);
            debug!(
                "Scored {}: {} ({} violations)",
                target, result.score, result.violation_count
            );
            result
        }
        Err(e) => {
            warn!("Failed to lint {}: {}", target, e);
            ScoreResult::failed(e.to_string())
        }
    }
}
