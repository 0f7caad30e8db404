use catalog_sync::{
    CatalogVersion, Feedback, JobHandle, ResultCode, StatusCode, SyncExecution, SyncMode,
    SyncOptions, SyncOutcome,
};
use catalog_sync_store::{ExecutionStore, SyncStatus};

fn handle(code: &str) -> JobHandle {
    JobHandle::new(
        code,
        CatalogVersion::new("electronics-spaContentCatalog", "Staged"),
        CatalogVersion::new("electronics-spaContentCatalog", "Online"),
    )
}

fn finished_execution(code: &str, result: ResultCode, status: StatusCode) -> SyncExecution {
    let mut exec = SyncExecution::new(handle(code), "electronics-spa");
    exec.configure(SyncOptions {
        force_update: true,
        mode: SyncMode::Incremental,
        ..SyncOptions::default()
    })
    .unwrap();
    exec.start().unwrap();
    exec.finish(result, status).unwrap();
    exec
}

fn create_store() -> ExecutionStore {
    ExecutionStore::open_in_memory().unwrap()
}

#[test]
fn history_is_empty_for_new_store() {
    let store = create_store();
    assert!(store.history(10).unwrap().is_empty());
}

#[test]
fn record_round_trips_execution_fields() {
    let store = create_store();
    let exec = finished_execution("sync-spa-online", ResultCode::Success, StatusCode::Finished);

    store.record_execution(&exec, &[]).unwrap();

    let record = store.last_for("sync-spa-online").unwrap().unwrap();
    assert_eq!(record.id, exec.id().as_str());
    assert_eq!(record.name, "electronics-spa");
    assert_eq!(record.source, "electronics-spaContentCatalog:Staged");
    assert_eq!(record.target, "electronics-spaContentCatalog:Online");
    assert_eq!(record.state, "finished");
    assert_eq!(record.outcome, SyncOutcome::succeeded());
    assert!(record.options.force_update);
    assert_eq!(record.options.mode, SyncMode::Incremental);
    assert_eq!(record.finished_at, exec.finished_at());
}

#[test]
fn logs_are_kept_in_order() {
    let store = create_store();
    let exec = finished_execution("sync-spa-online", ResultCode::Failure, StatusCode::Finished);
    let log = vec![
        Feedback::info("Begin synchronizing catalog [electronics-spa]"),
        Feedback::warning("Catalog [electronics-spa] sync has issues."),
        Feedback::info("Done synchronizing catalog [electronics-spa]"),
    ];

    store.record_execution(&exec, &log).unwrap();

    assert_eq!(store.logs_for(exec.id().as_str()).unwrap(), log);
}

#[test]
fn recording_twice_replaces_logs() {
    let store = create_store();
    let exec = finished_execution("sync-spa-online", ResultCode::Success, StatusCode::Finished);

    store
        .record_execution(&exec, &[Feedback::info("one"), Feedback::info("two")])
        .unwrap();
    store
        .record_execution(&exec, &[Feedback::info("three")])
        .unwrap();

    assert_eq!(store.history(10).unwrap().len(), 1);
    assert_eq!(
        store.logs_for(exec.id().as_str()).unwrap(),
        vec![Feedback::info("three")]
    );
}

#[test]
fn history_respects_limit() {
    let store = create_store();
    for _ in 0..5 {
        let exec = finished_execution("sync-spa-online", ResultCode::Success, StatusCode::Finished);
        store.record_execution(&exec, &[]).unwrap();
    }

    assert_eq!(store.history(3).unwrap().len(), 3);
    assert_eq!(store.history(10).unwrap().len(), 5);
}

#[test]
fn last_for_unknown_job_is_none() {
    let store = create_store();
    assert!(store.last_for("missing").unwrap().is_none());
}

#[test]
fn never_synced_without_clean_run() {
    let store = create_store();
    assert_eq!(
        store.sync_status("sync-spa-online").unwrap(),
        SyncStatus::NeverSynced
    );

    let failed = finished_execution("sync-spa-online", ResultCode::Failure, StatusCode::Finished);
    store.record_execution(&failed, &[]).unwrap();

    assert_eq!(
        store.sync_status("sync-spa-online").unwrap(),
        SyncStatus::NeverSynced
    );
}

#[test]
fn fresh_after_clean_run() {
    let store = create_store();
    let exec = finished_execution("sync-spa-online", ResultCode::Success, StatusCode::Finished);
    store.record_execution(&exec, &[]).unwrap();

    assert!(matches!(
        store.sync_status("sync-spa-online").unwrap(),
        SyncStatus::Fresh { days_old: 0 }
    ));
}

#[test]
fn stale_after_threshold() {
    let store = create_store();
    let exec = finished_execution("sync-spa-online", ResultCode::Success, StatusCode::Finished);
    store.record_execution(&exec, &[]).unwrap();

    let ten_days_ago = exec.finished_at().unwrap() - 10 * 86400;
    store
        .set_finished_at(exec.id().as_str(), ten_days_ago)
        .unwrap();

    assert!(matches!(
        store.sync_status("sync-spa-online").unwrap(),
        SyncStatus::Stale { days_old: 10 }
    ));
}

#[test]
fn open_on_disk_persists_between_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    let exec = finished_execution("sync-spa-online", ResultCode::Success, StatusCode::Finished);

    {
        let store = ExecutionStore::open(&path).unwrap();
        store.record_execution(&exec, &[]).unwrap();
    }

    let reopened = ExecutionStore::open(&path).unwrap();
    let record = reopened.last_for("sync-spa-online").unwrap().unwrap();
    assert_eq!(record.id, exec.id().as_str());
}

#[test]
fn separate_processes_keep_their_own_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");

    let first = finished_execution("sync-spa-online", ResultCode::Failure, StatusCode::Finished);
    let second = finished_execution("sync-spa-online", ResultCode::Success, StatusCode::Finished);
    assert_ne!(first.id(), second.id());

    {
        let store = ExecutionStore::open(&path).unwrap();
        store
            .record_execution(&first, &[Feedback::warning("first run has issues")])
            .unwrap();
    }
    {
        let store = ExecutionStore::open(&path).unwrap();
        store
            .record_execution(&second, &[Feedback::info("second run done")])
            .unwrap();
    }

    let store = ExecutionStore::open(&path).unwrap();
    let ids: Vec<String> = store.history(10).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id().to_string()));
    assert!(ids.contains(&second.id().to_string()));

    assert_eq!(
        store.logs_for(first.id().as_str()).unwrap(),
        vec![Feedback::warning("first run has issues")]
    );
    assert_eq!(
        store.logs_for(second.id().as_str()).unwrap(),
        vec![Feedback::info("second run done")]
    );
}
