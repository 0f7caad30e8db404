use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    CatalogVersion, ExecutionJournal, Feedback, FeedbackSink, ImportError, Importer, JobError,
    JobHandle, JobResolver, JobRunner, JournalError, SyncExecution, SyncJobDescriptor,
    SyncOptions, SyncOutcome,
};

/// The `electronics -> spa` staged descriptor used across tests.
pub fn sample_descriptor() -> SyncJobDescriptor {
    SyncJobDescriptor::new(
        "electronics->spa",
        CatalogVersion::new("electronicsContentCatalog", "Staged"),
        CatalogVersion::new("electronics-spaContentCatalog", "Staged"),
    )
}

/// Resolver backed by a map from descriptor to job handles.
#[derive(Default)]
pub struct InMemoryResolver {
    jobs: HashMap<SyncJobDescriptor, Vec<JobHandle>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_for(&mut self, descriptor: &SyncJobDescriptor, code: &str) {
        let handle = JobHandle::new(
            code,
            descriptor.source().clone(),
            descriptor.target().clone(),
        );
        self.jobs.entry(descriptor.clone()).or_default().push(handle);
    }
}

#[async_trait::async_trait]
impl JobResolver for InMemoryResolver {
    async fn resolve(&self, descriptor: &SyncJobDescriptor) -> Result<Vec<JobHandle>, JobError> {
        Ok(self.jobs.get(descriptor).cloned().unwrap_or_default())
    }
}

/// What a [`ScriptedRunner`] saw on one call.
#[derive(Debug, Clone)]
pub struct RunnerCall {
    pub job_code: String,
    pub options: SyncOptions,
    pub synchronous: bool,
}

enum Script {
    Outcome(SyncOutcome),
    Fail(String),
    LeaveRunning,
}

/// Runner that finishes every execution the same scripted way.
pub struct ScriptedRunner {
    script: Script,
    delay: Option<Duration>,
    calls: Mutex<Vec<RunnerCall>>,
}

impl ScriptedRunner {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(outcome: SyncOutcome) -> Self {
        Self::with_script(Script::Outcome(outcome))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Script::Fail(message.into()))
    }

    /// Returns without recording any result or status.
    pub fn leaving_running() -> Self {
        Self::with_script(Script::LeaveRunning)
    }

    /// Sleep before finishing, to exercise deadlines and cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobRunner for ScriptedRunner {
    async fn perform(
        &self,
        job: &JobHandle,
        execution: &mut SyncExecution,
        synchronous: bool,
    ) -> Result<(), JobError> {
        self.calls.lock().unwrap().push(RunnerCall {
            job_code: job.code().to_owned(),
            options: *execution.options(),
            synchronous,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Outcome(outcome) => execution
                .finish(outcome.result, outcome.status)
                .map_err(|e| JobError::Other(e.to_string())),
            Script::Fail(message) => Err(JobError::Remote(message.clone())),
            Script::LeaveRunning => Ok(()),
        }
    }
}

/// Sink that keeps every message for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<Feedback>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Feedback> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(|fb| fb.message().to_owned())
            .collect()
    }
}

impl FeedbackSink for RecordingSink {
    fn emit(&self, feedback: Feedback) {
        self.records.lock().unwrap().push(feedback);
    }
}

/// One file handed to a [`RecordingImporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub path: String,
    pub content: String,
    pub legacy_mode: bool,
}

/// Importer that accepts everything except paths it was told to reject.
#[derive(Default)]
pub struct RecordingImporter {
    rejected: Vec<String>,
    imported: Mutex<Vec<ImportedFile>>,
}

impl RecordingImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(mut self, path_suffix: impl Into<String>) -> Self {
        self.rejected.push(path_suffix.into());
        self
    }

    pub fn imported(&self) -> Vec<ImportedFile> {
        self.imported.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Importer for RecordingImporter {
    async fn import(
        &self,
        path: &str,
        content: &str,
        legacy_mode: bool,
    ) -> Result<(), ImportError> {
        if self.rejected.iter().any(|suffix| path.ends_with(suffix)) {
            return Err(ImportError::Rejected(format!("{path} has errors")));
        }
        self.imported.lock().unwrap().push(ImportedFile {
            path: path.to_owned(),
            content: content.to_owned(),
            legacy_mode,
        });
        Ok(())
    }
}

/// A journal entry captured by [`InMemoryJournal`].
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub execution_id: String,
    pub outcome: SyncOutcome,
    pub log: Vec<Feedback>,
}

#[derive(Default)]
pub struct InMemoryJournal {
    fail: bool,
    entries: Mutex<Vec<JournalEntry>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ExecutionJournal for InMemoryJournal {
    async fn record(
        &self,
        execution: &SyncExecution,
        log: &[Feedback],
    ) -> Result<(), JournalError> {
        if self.fail {
            return Err(JournalError::Storage("disk full".into()));
        }
        self.entries.lock().unwrap().push(JournalEntry {
            execution_id: execution.id().to_string(),
            outcome: execution.outcome(),
            log: log.to_vec(),
        });
        Ok(())
    }
}
