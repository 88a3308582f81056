use super::types::{
    CreateSpecRequest, GenerateCollectionRequest, GenerationResponse, ListSpecsResponse,
    SpecFile, SpecSummary, TaskStatus,
};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP client for the spec registry API
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    api_key_header: String,
    api_key: String,
    spec_type: String,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig, api_key: &str) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key_header: config.api_key_header.clone(),
            api_key: api_key.to_string(),
            spec_type: config.spec_type.clone(),
        })
    }

    /// Base URL with `segments` appended to its path, each one percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| RegistryError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/specs?workspaceId=..[&cursor=..]`
    fn specs_url(&self, workspace_id: &str, cursor: Option<&str>) -> Result<Url, RegistryError> {
        let mut url = self.endpoint(&["specs"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("workspaceId", workspace_id);
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        Ok(url)
    }

    /// Attach auth, send, and turn non-2xx statuses into errors
    async fn send(&self, request: RequestBuilder) -> Result<Response, RegistryError> {
        let response = request
            .header(self.api_key_header.as_str(), self.api_key.as_str())
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        trace!("Registry responded {}", status);
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RegistryError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| RegistryError::Decode(e.to_string()))
    }

    /// Upload a single-file spec, returning its registry id
    pub async fn create_spec(
        &self,
        workspace_id: &str,
        name: &str,
        file_path: &str,
        content: &str,
    ) -> Result<String, RegistryError> {
        debug!("Creating spec '{}' from {}", name, file_path);
        let body = CreateSpecRequest {
            name,
            spec_type: &self.spec_type,
            files: vec![SpecFile {
                path: file_path,
                content,
            }],
        };
        let url = self.specs_url(workspace_id, None)?;
        let response = self.send(self.client.post(url).json(&body)).await?;
        let created: SpecSummary = Self::decode(response).await?;
        debug!("Created spec '{}' with id {}", name, created.id);
        Ok(created.id)
    }

    /// List every spec in the workspace, following pagination cursors
    pub async fn list_specs(&self, workspace_id: &str) -> Result<Vec<SpecSummary>, RegistryError> {
        let mut specs = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let url = self.specs_url(workspace_id, cursor.as_deref())?;
            let response = self.send(self.client.get(url)).await?;
            let page: ListSpecsResponse = Self::decode(response).await?;
            trace!("Fetched page of {} specs", page.specs.len());
            specs.extend(page.specs);

            let next = page
                .meta
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            match next {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }
        debug!("Workspace {} has {} specs", workspace_id, specs.len());
        Ok(specs)
    }

    /// Delete a spec; a spec that is already gone counts as deleted
    pub async fn delete_spec(&self, spec_id: &str) -> Result<(), RegistryError> {
        let url = self.endpoint(&["specs", spec_id])?;
        match self.send(self.client.delete(url)).await {
            Ok(_) => Ok(()),
            Err(RegistryError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                debug!("Spec {} already deleted", spec_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_definition(&self, spec_id: &str) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["specs", spec_id, "definitions"])?;
        let response = self.send(self.client.get(url)).await?;
        Self::decode(response).await
    }

    /// Start collection generation, returning the task id to poll
    pub async fn generate_collection(
        &self,
        spec_id: &str,
        name: &str,
    ) -> Result<String, RegistryError> {
        let url = self.endpoint(&["specs", spec_id, "generations", "collection"])?;
        let body = GenerateCollectionRequest { name };
        let response = self.send(self.client.post(url).json(&body)).await?;
        let generation: GenerationResponse = Self::decode(response).await?;
        debug!(
            "Collection generation for spec {} started as task {}",
            spec_id, generation.task_id
        );
        Ok(generation.task_id)
    }

    pub async fn task_status(
        &self,
        spec_id: &str,
        task_id: &str,
    ) -> Result<TaskStatus, RegistryError> {
        let url = self.endpoint(&["specs", spec_id, "tasks", task_id])?;
        let response = self.send(self.client.get(url)).await?;
        Self::decode(response).await
    }
}

impl super::SpecCatalog for RegistryClient {
    async fn list_specs(&self, workspace_id: &str) -> Result<Vec<SpecSummary>, RegistryError> {
        RegistryClient::list_specs(self, workspace_id).await
    }
}
