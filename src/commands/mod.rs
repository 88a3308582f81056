pub mod govern;
pub mod registry;
pub mod report;

use crate::config::Settings;
use crate::error::RegistryError;
use crate::lint::{CliLinter, OutputFormat};
use crate::notify::Notifier;
use crate::registry::{PollPolicy, RegistryClient, TaskStatus, poll_task};
use crate::retry::{Sleeper, retry_with_backoff};
use serde_json::Value;
use tracing::{error, info, warn};

/// Build the registry client, failing early when no API key is configured
pub(crate) fn registry_client(settings: &Settings) -> anyhow::Result<RegistryClient> {
    let api_key = settings.credentials.require_api_key()?;
    Ok(RegistryClient::new(&settings.config.registry, api_key)?)
}

pub(crate) fn linter(settings: &Settings, format: Option<OutputFormat>) -> CliLinter {
    CliLinter::new(
        &settings.config.lint,
        format.unwrap_or(settings.config.lint.format),
        settings.credentials.workspace_id.as_deref(),
    )
}

/// Build the notifier if notifications were requested
///
/// Asking for a notification without a webhook URL is a configuration error,
/// reported before any work is done.
pub(crate) fn notifier(settings: &Settings, requested: bool) -> anyhow::Result<Option<Notifier>> {
    if !requested {
        return Ok(None);
    }
    let url = settings.credentials.require_webhook_url()?;
    Ok(Some(Notifier::new(url)))
}

/// Deliver a card; returns whether the run may still succeed
///
/// Delivery failures never change the verdict unless `required` is set.
pub(crate) async fn deliver(notifier: &Notifier, payload: &Value, required: bool) -> bool {
    match notifier.post(payload).await {
        Ok(()) => true,
        Err(e) if required => {
            error!("Failed to deliver notification: {}", e);
            false
        }
        Err(e) => {
            warn!("Failed to deliver notification: {}", e);
            true
        }
    }
}

/// Start collection generation for a spec and wait for the task to finish
pub(crate) async fn generate_and_wait<S: Sleeper>(
    client: &RegistryClient,
    settings: &Settings,
    sleeper: &S,
    spec_id: &str,
    collection_name: &str,
) -> Result<TaskStatus, RegistryError> {
    let retry = settings.config.retry_policy();
    let task_id = retry_with_backoff("Generate collection", &retry, sleeper, || {
        client.generate_collection(spec_id, collection_name)
    })
    .await?;
    info!("[Spec {}] Generating collection (task {})", spec_id, task_id);

    let task_id = task_id.as_str();
    let retry = &retry;
    let policy = PollPolicy::from(&settings.config.poll);
    poll_task(task_id, &policy, sleeper, move || {
        retry_with_backoff("Poll task", retry, sleeper, move || {
            client.task_status(spec_id, task_id)
        })
    })
    .await
}
