use catalog_sync::{CatalogVersion, JobHandle, SyncMode, SyncOptions};
use serde::{Deserialize, Serialize};

/// A catalog version as the platform spells it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVersionRef {
    pub catalog: String,
    pub version: String,
}

impl From<CatalogVersionRef> for CatalogVersion {
    fn from(r: CatalogVersionRef) -> Self {
        CatalogVersion::new(r.catalog, r.version)
    }
}

/// Entry from `GET /catalogs/{catalog}/versions/{version}/incoming-syncs`.
#[derive(Debug, Deserialize)]
pub struct IncomingSync {
    pub code: String,
    pub source: CatalogVersionRef,
    pub target: CatalogVersionRef,
}

impl From<IncomingSync> for JobHandle {
    fn from(sync: IncomingSync) -> Self {
        JobHandle::new(sync.code, sync.source.into(), sync.target.into())
    }
}

/// Body of `POST /sync-jobs/{code}/executions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub log_to_database: bool,
    pub log_to_file: bool,
    pub force_update: bool,
    pub full_sync: bool,
    pub synchronous: bool,
}

impl ExecutionRequest {
    pub fn new(options: &SyncOptions, synchronous: bool) -> Self {
        Self {
            log_to_database: options.persist_to_store,
            log_to_file: options.persist_to_file,
            force_update: options.force_update,
            full_sync: options.mode == SyncMode::Full,
            synchronous,
        }
    }
}

/// Response of `POST /sync-jobs/{code}/executions`.
#[derive(Debug, Deserialize)]
pub struct ExecutionResponse {
    pub result: String,
    pub status: String,
}

/// Body of `POST /imports`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub legacy_mode: bool,
}

/// Response of `POST /imports`.
#[derive(Debug, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
