use super::ReportEntry;
use crate::error::RegistryError;
use crate::lint::{self, LintTarget, Linter};
use crate::registry::SpecCatalog;
use crate::retry::{RetryPolicy, Sleeper, retry_with_backoff};
use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn extension_globset(extensions: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let pattern = format!("*.{}", ext.trim_start_matches('.'));
        let glob = GlobBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid spec extension '{}'", ext))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Spec files directly inside `dir`, sorted by file name
pub fn list_spec_files(dir: &Path, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let globset = extension_globset(extensions)?;
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let matched = path
            .file_name()
            .is_some_and(|name| globset.is_match(Path::new(name)));
        if matched {
            files.push(path);
        }
    }
    files.sort();
    debug!("Found {} spec files in {}", files.len(), dir.display());
    Ok(files)
}

/// Name shown for a spec file: its file stem
pub fn spec_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lint and score every spec file in `dir`
///
/// A spec that cannot be linted becomes a FAIL entry; only failing to list
/// the directory aborts the run.
pub async fn aggregate_directory<L: Linter>(
    dir: &Path,
    extensions: &[String],
    linter: &L,
    threshold: u32,
) -> anyhow::Result<Vec<ReportEntry>> {
    let files = list_spec_files(dir, extensions)?;
    info!("Scoring {} specs in {}", files.len(), dir.display());

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let name = spec_name(&path);
        let result = lint::lint_and_score(linter, &LintTarget::File(path.clone())).await;
        let entry = ReportEntry::from_result(name, path.display().to_string(), &result, threshold);
        log_entry(&entry);
        entries.push(entry);
    }
    Ok(entries)
}

/// Lint and score every spec registered in a workspace, in listing order
pub async fn aggregate_workspace<C, L, S>(
    catalog: &C,
    workspace_id: &str,
    linter: &L,
    threshold: u32,
    retry: &RetryPolicy,
    sleeper: &S,
) -> Result<Vec<ReportEntry>, RegistryError>
where
    C: SpecCatalog,
    L: Linter,
    S: Sleeper,
{
    let specs = retry_with_backoff("List specs", retry, sleeper, || {
        catalog.list_specs(workspace_id)
    })
    .await?;
    info!("Scoring {} specs in workspace {}", specs.len(), workspace_id);

    let mut entries = Vec::with_capacity(specs.len());
    for spec in specs {
        let target = LintTarget::RegistrySpec(spec.id.clone());
        let result = lint::lint_and_score(linter, &target).await;
        let entry = ReportEntry::from_result(spec.name, spec.id, &result, threshold);
        log_entry(&entry);
        entries.push(entry);
    }
    Ok(entries)
}

fn log_entry(entry: &ReportEntry) {
    match &entry.error {
        Some(error) => warn!("[Spec {}] {} - {}", entry.name, entry.status.as_str(), error),
        None => info!(
            "[Spec {}] {} - score {} ({} violations)",
            entry.name,
            entry.status.as_str(),
            entry.score,
            entry.violations_count
        ),
    }
}
