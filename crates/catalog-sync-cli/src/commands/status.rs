use anyhow::Result;
use catalog_sync_store::SyncStatus;

use crate::commands;
use crate::config::AppConfig;

/// Show how fresh the last clean run of a job is, plus its latest execution.
pub fn run(app: &AppConfig, job_code: &str) -> Result<()> {
    let store = commands::open_store(app)?;

    match store.sync_status(job_code)? {
        SyncStatus::NeverSynced => {
            println!("[{job_code}] has never synchronized cleanly.");
        }
        SyncStatus::Stale { days_old } => {
            eprintln!(
                "warning: last clean synchronization of [{job_code}] is {days_old} days old."
            );
            eprintln!("Run `catalog-sync sync` to refresh.");
        }
        SyncStatus::Fresh { days_old } => {
            println!("[{job_code}] synchronized cleanly {days_old} days ago.");
        }
    }

    if let Some(last) = store.last_for(job_code)? {
        println!("Latest execution: {} ({}, {})", last.id, last.outcome, last.state);
        for line in store.logs_for(&last.id)? {
            println!("  {line}");
        }
    }

    Ok(())
}
