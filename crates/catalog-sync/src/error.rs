use crate::execution::ExecutionState;
use crate::outcome::SyncOutcome;

/// Errors raised by the synchronization orchestrator.
///
/// Degraded job outcomes are not errors; they come back as a
/// [`SyncOutcome`](crate::SyncOutcome) for the caller to classify.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no incoming synchronizations found for {0}")]
    InvalidDescriptor(String),

    #[error("failed to resolve synchronization jobs: {0}")]
    Resolve(#[from] JobError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("synchronization of [{name}] escalated: {outcome}")]
    Escalated { name: String, outcome: SyncOutcome },
}

/// Errors reported by job resolvers and runners.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// Invalid lifecycle transitions on a [`SyncExecution`](crate::SyncExecution).
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("invalid execution transition from {from} to {to}")]
    InvalidTransition {
        from: ExecutionState,
        to: ExecutionState,
    },
}

/// Errors reported by an [`Importer`](crate::Importer).
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// Errors that stop an import pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("step [{step}] could not read {path}: {source}")]
    Io {
        step: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("step [{step}] import failed: {source}")]
    Import {
        step: String,
        #[source]
        source: ImportError,
    },

    #[error("step [{step}] synchronization failed: {source}")]
    Sync {
        step: String,
        #[source]
        source: SyncError,
    },

    #[error("step [{step}] cancelled")]
    Cancelled { step: String },
}

impl StepError {
    /// Name of the step that failed.
    pub fn step(&self) -> &str {
        match self {
            Self::Io { step, .. }
            | Self::Import { step, .. }
            | Self::Sync { step, .. }
            | Self::Cancelled { step } => step,
        }
    }
}

/// Errors reported by an [`ExecutionJournal`](crate::ExecutionJournal).
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("storage error: {0}")]
    Storage(String),
}
