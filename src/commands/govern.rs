use super::{deliver, generate_and_wait, linter, notifier, registry::upload_file, registry_client};
use crate::cli::{GovernArgs, LintArgs};
use crate::config::Settings;
use crate::lint::{self, LintTarget, ScoreResult};
use crate::notify::{self, SpecScoreCard};
use crate::report::{ReportEntry, aggregate::spec_name};
use crate::retry::{Sleeper, TokioSleeper, retry_with_backoff};
use tracing::{error, info, warn};

/// Lint a local file or a registry spec and report its verdict
pub async fn run_lint(settings: &Settings, args: &LintArgs) -> anyhow::Result<bool> {
    let threshold = settings.threshold(args.verdict.threshold)?;
    let notifier = notifier(settings, args.verdict.notify)?;
    let linter = linter(settings, args.format);

    let (target, name, id) = match (&args.file, &args.spec_id) {
        (Some(file), _) => (
            LintTarget::File(file.clone()),
            spec_name(file),
            file.display().to_string(),
        ),
        (None, Some(spec_id)) => (
            LintTarget::RegistrySpec(spec_id.clone()),
            spec_id.clone(),
            spec_id.clone(),
        ),
        (None, None) => anyhow::bail!("Nothing to lint: pass --file or --spec-id"),
    };

    let result = lint::lint_and_score(&linter, &target).await;
    let entry = ReportEntry::from_result(&name, &id, &result, threshold);
    log_verdict(&entry, threshold);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    let mut ok = entry.passed();
    if let Some(notifier) = &notifier {
        let payload = notify::single_payload(&SpecScoreCard {
            name: &name,
            result: &result,
            threshold,
        });
        ok &= deliver(notifier, &payload, args.verdict.require_notify).await;
    }
    Ok(ok)
}

/// Upload a spec, lint it in the registry, then optionally generate and clean up
pub async fn run_govern(settings: &Settings, args: &GovernArgs) -> anyhow::Result<bool> {
    let threshold = settings.threshold(args.verdict.threshold)?;
    let notifier = notifier(settings, args.verdict.notify)?;
    let workspace_id = settings.credentials.require_workspace_id()?;
    let client = registry_client(settings)?;
    let linter = linter(settings, args.format);

    let name = args.name.clone().unwrap_or_else(|| spec_name(&args.file));
    let spec_id = upload_file(&client, settings, workspace_id, &args.file, &name).await?;
    info!("[Spec {}] Uploaded as {}", name, spec_id);

    let result: ScoreResult =
        lint::lint_and_score(&linter, &LintTarget::RegistrySpec(spec_id.clone())).await;
    let entry = ReportEntry::from_result(&name, &spec_id, &result, threshold);
    log_verdict(&entry, threshold);

    let mut ok = entry.passed();

    if args.generate_collection {
        if entry.passed() {
            TokioSleeper.sleep(settings.config.batch_delay()).await;
            let collection_name = format!("{} Collection", name);
            match generate_and_wait(&client, settings, &TokioSleeper, &spec_id, &collection_name)
                .await
            {
                Ok(status) => info!(
                    "[Spec {}] Collection generated{}",
                    name,
                    status
                        .resource_id()
                        .map(|id| format!(": {}", id))
                        .unwrap_or_default()
                ),
                Err(e) => {
                    error!("[Spec {}] Collection generation failed: {}", name, e);
                    ok = false;
                }
            }
        } else {
            info!("[Spec {}] Skipping collection generation for failing spec", name);
        }
    }

    if let Some(notifier) = &notifier {
        let payload = notify::single_payload(&SpecScoreCard {
            name: &name,
            result: &result,
            threshold,
        });
        ok &= deliver(notifier, &payload, args.verdict.require_notify).await;
    }

    if args.cleanup {
        TokioSleeper.sleep(settings.config.batch_delay()).await;
        match retry_with_backoff(
            "Delete spec",
            &settings.config.retry_policy(),
            &TokioSleeper,
            || client.delete_spec(&spec_id),
        )
        .await
        {
            Ok(()) => info!("[Spec {}] Deleted {}", name, spec_id),
            // The verdict stands; a leftover spec only needs manual cleanup
            Err(e) => warn!("[Spec {}] Failed to delete {}: {}", name, spec_id, e),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    }
    Ok(ok)
}

fn log_verdict(entry: &ReportEntry, threshold: u32) {
    match &entry.error {
        Some(error) => error!("[Spec {}] {}: {}", entry.name, entry.status.as_str(), error),
        None if entry.passed() => info!(
            "[Spec {}] {}: score {} with {} violations (threshold {})",
            entry.name,
            entry.status.as_str(),
            entry.score,
            entry.violations_count,
            threshold
        ),
        None => error!(
            "[Spec {}] {}: score {} with {} violations (threshold {})",
            entry.name,
            entry.status.as_str(),
            entry.score,
            entry.violations_count,
            threshold
        ),
    }
}
