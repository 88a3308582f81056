use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A spec as listed by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /specs`
#[derive(Debug, Serialize)]
pub(crate) struct CreateSpecRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub spec_type: &'a str,
    pub files: Vec<SpecFile<'a>>,
}

/// One file of a multi-file spec
#[derive(Debug, Serialize)]
pub(crate) struct SpecFile<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListSpecsResponse {
    #[serde(default)]
    pub specs: Vec<SpecSummary>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListMeta {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Body of `POST /specs/{id}/generations/collection`
#[derive(Debug, Serialize)]
pub(crate) struct GenerateCollectionRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationResponse {
    pub task_id: String,
}

/// Progress of an asynchronous registry task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Coarse phase of a task, derived from its status string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn phase(&self) -> TaskPhase {
        match self.status.to_ascii_lowercase().as_str() {
            "completed" | "complete" | "succeeded" | "success" => TaskPhase::Completed,
            "failed" | "error" => TaskPhase::Failed,
            _ => TaskPhase::Running,
        }
    }

    /// Best-effort description of why a task failed
    pub fn failure_reason(&self) -> String {
        self.details
            .as_ref()
            .and_then(|d| {
                d.get("error")
                    .or_else(|| d.get("message"))
                    .and_then(|e| e.get("message").or(Some(e)))
            })
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("status {}", self.status))
    }

    /// Id of the first resource the task produced, if reported
    pub fn resource_id(&self) -> Option<&str> {
        self.details
            .as_ref()?
            .get("resources")?
            .as_array()?
            .first()?
            .get("id")?
            .as_str()
    }
}
