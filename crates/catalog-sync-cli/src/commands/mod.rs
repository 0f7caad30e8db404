pub mod history;
pub mod run;
pub mod status;
pub mod sync;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_sync::{FailurePolicy, SyncLimits, SyncOrchestrator, TracingSink};
use catalog_sync_http::{PlatformClient, PlatformConfig};
use catalog_sync_store::ExecutionStore;

use crate::config::{self, AppConfig};

pub fn open_store(app: &AppConfig) -> Result<ExecutionStore> {
    let path = match &app.store.path {
        Some(p) => p.clone(),
        None => config::default_store_path()?,
    };
    ExecutionStore::open(&path)
        .with_context(|| format!("failed to open history at {}", path.display()))
}

pub fn platform_client(app: &AppConfig) -> Arc<PlatformClient> {
    Arc::new(PlatformClient::new(PlatformConfig {
        base_url: app.platform.base_url.clone(),
        token: app.platform.token(),
    }))
}

/// Wire the platform client, history store and tracing sink into an orchestrator.
pub fn orchestrator(
    client: Arc<PlatformClient>,
    store: Arc<ExecutionStore>,
    policy: FailurePolicy,
    deadline_secs: Option<u64>,
) -> SyncOrchestrator {
    SyncOrchestrator::new(client.clone(), client, Arc::new(TracingSink))
        .with_policy(policy)
        .with_limits(SyncLimits {
            deadline: deadline_secs.map(Duration::from_secs),
        })
        .with_journal(store)
}
