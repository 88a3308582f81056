use super::{deliver, linter, notifier, registry_client};
use crate::cli::{DashboardArgs, NotifyArgs, ReportArgs};
use crate::config::Settings;
use crate::notify;
use crate::report::{self, ReportEntry, ReportSummary, dashboard};
use crate::retry::TokioSleeper;
use anyhow::Context;
use std::path::Path;
use tracing::{error, info};

/// Score a directory or workspace, write the JSON report and dashboard
///
/// Returns false if any spec failed or a required notification was not delivered.
pub async fn run_report(settings: &Settings, args: &ReportArgs) -> anyhow::Result<bool> {
    let threshold = settings.threshold(args.verdict.threshold)?;
    let notifier = notifier(settings, args.verdict.notify)?;
    let linter = linter(settings, args.format);

    let entries = if let Some(dir) = &args.dir {
        report::aggregate_directory(dir, &settings.config.lint.extensions, &linter, threshold)
            .await?
    } else {
        let workspace_id = settings.credentials.require_workspace_id()?;
        let client = registry_client(settings)?;
        report::aggregate_workspace(
            &client,
            workspace_id,
            &linter,
            threshold,
            &settings.config.retry_policy(),
            &TokioSleeper,
        )
        .await
        .context("Failed to list workspace specs")?
    };

    report::write_report(&args.output, &entries)?;
    write_dashboard(&args.html, &entries)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    }

    let summary = log_summary(&entries, threshold);

    let mut ok = summary.failed == 0;
    if let Some(notifier) = &notifier {
        let payload =
            notify::batch_payload(&entries, threshold, settings.config.notify.max_detail_lines);
        ok &= deliver(notifier, &payload, args.verdict.require_notify).await;
    }
    Ok(ok)
}

/// Re-render the dashboard from a saved report
pub fn run_dashboard(args: &DashboardArgs) -> anyhow::Result<bool> {
    let entries = report::read_report(&args.report)?;
    write_dashboard(&args.html, &entries)?;
    Ok(true)
}

/// Post a batch card built from a saved report
pub async fn run_notify(settings: &Settings, args: &NotifyArgs) -> anyhow::Result<bool> {
    let threshold = settings.threshold(args.threshold)?;
    let notifier = notifier(settings, true)?.context("Notifier not configured")?;
    let entries = report::read_report(&args.report)?;
    let payload =
        notify::batch_payload(&entries, threshold, settings.config.notify.max_detail_lines);
    Ok(deliver(&notifier, &payload, true).await)
}

fn write_dashboard(path: &Path, entries: &[ReportEntry]) -> anyhow::Result<()> {
    std::fs::write(path, dashboard::render(entries))
        .with_context(|| format!("Failed to write dashboard {}", path.display()))?;
    info!("Dashboard written to {}", path.display());
    Ok(())
}

fn log_summary(entries: &[ReportEntry], threshold: u32) -> ReportSummary {
    let summary = ReportSummary::from_entries(entries);
    info!(
        "Governance complete: {} specs, {} passed, {} failed, average score {:.1} (threshold {})",
        summary.total, summary.passed, summary.failed, summary.average_score, threshold
    );
    if summary.failed > 0 {
        let failing: Vec<&str> = entries
            .iter()
            .filter(|e| !e.passed())
            .map(|e| e.name.as_str())
            .collect();
        error!("Specs below threshold: {:?}", failing);
    }
    summary
}
