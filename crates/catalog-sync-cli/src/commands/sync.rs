use std::sync::Arc;

use anyhow::Result;
use catalog_sync::{
    CatalogVersion, FailurePolicy, SyncDecision, SyncError, SyncJobDescriptor, SyncOptions,
};

use crate::commands;
use crate::config::AppConfig;

/// Flags for a single ad-hoc synchronization.
#[derive(Debug, Clone)]
pub struct SyncArgs {
    pub name: String,
    pub source: CatalogVersion,
    pub target: CatalogVersion,
    pub options: SyncOptions,
    pub policy: FailurePolicy,
    pub deadline_secs: Option<u64>,
}

/// Run one synchronization; Ctrl-C aborts the run.
pub async fn run(app: &AppConfig, args: SyncArgs) -> Result<()> {
    let store = Arc::new(commands::open_store(app)?);
    let client = commands::platform_client(app);
    let orchestrator = commands::orchestrator(client, store, args.policy, args.deadline_secs);

    let descriptor = SyncJobDescriptor::new(&args.name, args.source, args.target);
    println!("Synchronizing {descriptor}...");

    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let outcome = orchestrator
        .synchronize_until(&descriptor, &args.options, cancel)
        .await?;

    match orchestrator.classify(&outcome) {
        SyncDecision::Continue => {
            println!("Synchronization finished: {outcome}.");
            Ok(())
        }
        SyncDecision::ContinueWithWarning => {
            println!("Synchronization finished with issues: {outcome}.");
            Ok(())
        }
        SyncDecision::Escalate => Err(SyncError::Escalated {
            name: args.name,
            outcome,
        }
        .into()),
    }
}
