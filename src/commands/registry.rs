use super::{generate_and_wait, registry_client};
use crate::cli::{DefinitionArgs, DeleteArgs, GenerateArgs, ListArgs, UploadArgs};
use crate::config::Settings;
use crate::registry::{RegistryClient, SpecSummary};
use crate::report::{aggregate::spec_name, list_spec_files};
use crate::retry::{Sleeper, TokioSleeper, retry_with_backoff};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Upload one file or every spec file in a directory
pub async fn run_upload(settings: &Settings, args: &UploadArgs) -> anyhow::Result<bool> {
    let workspace_id = settings.credentials.require_workspace_id()?;
    let client = registry_client(settings)?;

    let files: Vec<PathBuf> = match (&args.file, &args.dir) {
        (Some(file), _) => vec![file.clone()],
        (None, Some(dir)) => list_spec_files(dir, &settings.config.lint.extensions)?,
        (None, None) => anyhow::bail!("Nothing to upload: pass --file or --dir"),
    };

    let mut failed = 0;
    for (i, path) in files.iter().enumerate() {
        if i > 0 {
            TokioSleeper.sleep(settings.config.batch_delay()).await;
        }
        let name = args.name.clone().unwrap_or_else(|| spec_name(path));
        match upload_file(&client, settings, workspace_id, path, &name).await {
            Ok(id) => {
                info!("[Spec {}] Uploaded as {}", name, id);
                println!("{}\t{}", id, name);
            }
            Err(e) => {
                error!("[Spec {}] Upload failed: {:#}", name, e);
                failed += 1;
            }
        }
    }

    info!("Uploaded {} of {} specs", files.len() - failed, files.len());
    Ok(failed == 0)
}

/// Read a spec file and create it in the registry, returning the new id
pub(crate) async fn upload_file(
    client: &RegistryClient,
    settings: &Settings,
    workspace_id: &str,
    path: &Path,
    name: &str,
) -> anyhow::Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let id = retry_with_backoff(
        "Create spec",
        &settings.config.retry_policy(),
        &TokioSleeper,
        || client.create_spec(workspace_id, name, &file_name, &content),
    )
    .await?;
    Ok(id)
}

pub async fn run_list(settings: &Settings, args: &ListArgs) -> anyhow::Result<bool> {
    let workspace_id = settings.credentials.require_workspace_id()?;
    let client = registry_client(settings)?;
    let specs = list_workspace(&client, settings, workspace_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
    } else if specs.is_empty() {
        info!("No specs in workspace {}", workspace_id);
    } else {
        for spec in &specs {
            println!("{}\t{}", spec.id, spec.name);
        }
    }
    Ok(true)
}

async fn list_workspace(
    client: &RegistryClient,
    settings: &Settings,
    workspace_id: &str,
) -> anyhow::Result<Vec<SpecSummary>> {
    retry_with_backoff(
        "List specs",
        &settings.config.retry_policy(),
        &TokioSleeper,
        || client.list_specs(workspace_id),
    )
    .await
    .context("Failed to list workspace specs")
}

pub async fn run_delete(settings: &Settings, args: &DeleteArgs) -> anyhow::Result<bool> {
    let client = registry_client(settings)?;
    let retry = settings.config.retry_policy();

    let mut failed = 0;
    for (i, spec_id) in args.spec_ids.iter().enumerate() {
        if i > 0 {
            TokioSleeper.sleep(settings.config.batch_delay()).await;
        }
        match retry_with_backoff("Delete spec", &retry, &TokioSleeper, || {
            client.delete_spec(spec_id)
        })
        .await
        {
            Ok(()) => info!("[Spec {}] Deleted", spec_id),
            Err(e) => {
                error!("[Spec {}] Delete failed: {}", spec_id, e);
                failed += 1;
            }
        }
    }
    Ok(failed == 0)
}

pub async fn run_definition(settings: &Settings, args: &DefinitionArgs) -> anyhow::Result<bool> {
    let client = registry_client(settings)?;
    let definition = retry_with_backoff(
        "Get definition",
        &settings.config.retry_policy(),
        &TokioSleeper,
        || client.get_definition(&args.spec_id),
    )
    .await
    .with_context(|| format!("Failed to fetch definition of {}", args.spec_id))?;

    let content = serde_json::to_string_pretty(&definition)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Definition written to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(true)
}

/// Generate a collection for each selected spec, one at a time
pub async fn run_generate(settings: &Settings, args: &GenerateArgs) -> anyhow::Result<bool> {
    let client = registry_client(settings)?;

    let specs: Vec<SpecSummary> = if args.all {
        let workspace_id = settings.credentials.require_workspace_id()?;
        list_workspace(&client, settings, workspace_id).await?
    } else {
        args.spec_ids
            .iter()
            .map(|id| SpecSummary {
                id: id.clone(),
                name: id.clone(),
            })
            .collect()
    };

    let mut failed = 0;
    for (i, spec) in specs.iter().enumerate() {
        if i > 0 {
            TokioSleeper.sleep(settings.config.batch_delay()).await;
        }
        let collection_name = format!("{} Collection", spec.name);
        match generate_and_wait(&client, settings, &TokioSleeper, &spec.id, &collection_name).await
        {
            Ok(status) => info!(
                "[Spec {}] Collection generated{}",
                spec.name,
                status
                    .resource_id()
                    .map(|id| format!(": {}", id))
                    .unwrap_or_default()
            ),
            Err(e) => {
                error!("[Spec {}] Collection generation failed: {}", spec.name, e);
                failed += 1;
            }
        }
    }

    info!(
        "Generated {} of {} collections",
        specs.len() - failed,
        specs.len()
    );
    Ok(failed == 0)
}
