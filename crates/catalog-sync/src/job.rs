use std::sync::Arc;

use crate::catalog::{JobHandle, SyncJobDescriptor};
use crate::error::{ImportError, JobError, JournalError};
use crate::execution::SyncExecution;
use crate::feedback::Feedback;

/// Looks up the synchronization definitions that can serve a descriptor.
#[async_trait::async_trait]
pub trait JobResolver: Send + Sync {
    /// Return zero or more job handles, best match first.
    async fn resolve(&self, descriptor: &SyncJobDescriptor) -> Result<Vec<JobHandle>, JobError>;
}

/// Performs the propagation work for a configured execution.
///
/// Implementations move the execution to a terminal state through
/// [`SyncExecution::finish`] before returning. With `synchronous` set the
/// call must not return until the platform job is done.
#[async_trait::async_trait]
pub trait JobRunner: Send + Sync {
    async fn perform(
        &self,
        job: &JobHandle,
        execution: &mut SyncExecution,
        synchronous: bool,
    ) -> Result<(), JobError>;
}

/// A file-based import of structured records into the platform.
#[async_trait::async_trait]
pub trait Importer: Send + Sync {
    /// Import one file. `path` is informational; `content` is what gets imported.
    async fn import(&self, path: &str, content: &str, legacy_mode: bool)
    -> Result<(), ImportError>;
}

/// Keeps a history of finished executions.
#[async_trait::async_trait]
pub trait ExecutionJournal: Send + Sync {
    /// Record a finished execution along with any log lines worth keeping.
    async fn record(&self, execution: &SyncExecution, log: &[Feedback])
    -> Result<(), JournalError>;
}

#[async_trait::async_trait]
impl<T: JobResolver + ?Sized> JobResolver for Arc<T> {
    async fn resolve(&self, descriptor: &SyncJobDescriptor) -> Result<Vec<JobHandle>, JobError> {
        (**self).resolve(descriptor).await
    }
}

#[async_trait::async_trait]
impl<T: JobRunner + ?Sized> JobRunner for Arc<T> {
    async fn perform(
        &self,
        job: &JobHandle,
        execution: &mut SyncExecution,
        synchronous: bool,
    ) -> Result<(), JobError> {
        (**self).perform(job, execution, synchronous).await
    }
}

#[async_trait::async_trait]
impl<T: Importer + ?Sized> Importer for Arc<T> {
    async fn import(
        &self,
        path: &str,
        content: &str,
        legacy_mode: bool,
    ) -> Result<(), ImportError> {
        (**self).import(path, content, legacy_mode).await
    }
}

#[async_trait::async_trait]
impl<T: ExecutionJournal + ?Sized> ExecutionJournal for Arc<T> {
    async fn record(
        &self,
        execution: &SyncExecution,
        log: &[Feedback],
    ) -> Result<(), JournalError> {
        (**self).record(execution, log).await
    }
}
