use catalog_sync::{
    ImportError, Importer, JobError, JobHandle, JobResolver, JobRunner, ResultCode, StatusCode,
    SyncExecution, SyncJobDescriptor,
};

use crate::wire::{
    ExecutionRequest, ExecutionResponse, ImportRequest, ImportResponse, IncomingSync,
};

/// Connection settings for the catalog platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    pub token: Option<String>,
}

/// Talks to a catalog platform's REST API.
///
/// Serves as job resolver, job runner and importer for the orchestrator.
pub struct PlatformClient {
    config: PlatformConfig,
    client: reqwest::Client,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Build an endpoint URL from path segments, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| format!("invalid base URL {}: {e}", self.config.base_url))?;
        url.path_segments_mut()
            .map_err(|_| format!("base URL cannot have a path: {}", self.config.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header("User-Agent", "catalog-sync");
        match &self.config.token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    async fn error_body(response: reqwest::Response) -> String {
        format!(
            "HTTP {}: {}",
            response.status(),
            response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".into())
        )
    }
}

#[async_trait::async_trait]
impl JobResolver for PlatformClient {
    async fn resolve(&self, descriptor: &SyncJobDescriptor) -> Result<Vec<JobHandle>, JobError> {
        let target = descriptor.target();
        let url = self
            .endpoint(&[
                "catalogs",
                target.catalog.as_str(),
                "versions",
                target.version.as_str(),
                "incoming-syncs",
            ])
            .map_err(JobError::Other)?;

        tracing::debug!(%url, "resolving incoming synchronizations");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| JobError::Network(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Err(JobError::NotFound(format!("catalog version {target}")));
        }

        if !response.status().is_success() {
            return Err(JobError::Remote(Self::error_body(response).await));
        }

        let incoming: Vec<IncomingSync> = response
            .json()
            .await
            .map_err(|e| JobError::Parse(e.to_string()))?;

        Ok(incoming
            .into_iter()
            .map(JobHandle::from)
            .filter(|handle| &handle.source == descriptor.source())
            .collect())
    }
}

#[async_trait::async_trait]
impl JobRunner for PlatformClient {
    async fn perform(
        &self,
        job: &JobHandle,
        execution: &mut SyncExecution,
        synchronous: bool,
    ) -> Result<(), JobError> {
        let url = self
            .endpoint(&["sync-jobs", job.code(), "executions"])
            .map_err(JobError::Other)?;
        let body = ExecutionRequest::new(execution.options(), synchronous);

        tracing::debug!(%url, execution = %execution.id(), "performing synchronization");

        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| JobError::Network(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Err(JobError::NotFound(format!("sync job {job}")));
        }

        if !response.status().is_success() {
            return Err(JobError::Remote(Self::error_body(response).await));
        }

        let result: ExecutionResponse = response
            .json()
            .await
            .map_err(|e| JobError::Parse(e.to_string()))?;

        execution
            .finish(
                ResultCode::parse(&result.result),
                StatusCode::parse(&result.status),
            )
            .map_err(|e| JobError::Other(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Importer for PlatformClient {
    async fn import(
        &self,
        path: &str,
        content: &str,
        legacy_mode: bool,
    ) -> Result<(), ImportError> {
        let url = self.endpoint(&["imports"]).map_err(ImportError::Other)?;
        let body = ImportRequest {
            path,
            content,
            legacy_mode,
        };

        tracing::debug!(%url, %path, "submitting import");

        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ImportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImportError::Rejected(Self::error_body(response).await));
        }

        let result: ImportResponse = response
            .json()
            .await
            .map_err(|e| ImportError::Parse(e.to_string()))?;

        if !result.success {
            return Err(ImportError::Rejected(
                result
                    .message
                    .unwrap_or_else(|| format!("{path} was not imported")),
            ));
        }

        Ok(())
    }
}
