pub mod catalog;
pub mod error;
pub mod execution;
pub mod feedback;
pub mod import;
pub mod job;
pub mod options;
pub mod orchestrator;
pub mod outcome;

pub use catalog::{CatalogVersion, JobHandle, SyncJobDescriptor};
pub use error::{ExecutionError, ImportError, JobError, JournalError, StepError, SyncError};
pub use execution::{ExecutionId, ExecutionState, SyncExecution};
pub use feedback::{Feedback, FeedbackSink, NullSink, TracingSink};
pub use import::{
    ImportFileStep, ImportPipeline, ImportStep, MissingJob, PipelineError, PipelineReport,
    StepContext, StepReport, StepStatus, SyncStep,
};
pub use job::{ExecutionJournal, Importer, JobResolver, JobRunner};
pub use options::{SyncMode, SyncOptions};
pub use orchestrator::{SyncLimits, SyncOrchestrator, SyncReport};
pub use outcome::{FailurePolicy, ResultCode, StatusCode, SyncDecision, SyncOutcome, classify};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
