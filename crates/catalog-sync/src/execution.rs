use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::catalog::JobHandle;
use crate::error::ExecutionError;
use crate::options::SyncOptions;
use crate::outcome::{ResultCode, StatusCode, SyncOutcome};

/// Unique identifier for one run of a synchronization job.
///
/// Random (v4) so runs from separate processes never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionId(String);

impl ExecutionId {
    fn generate() -> Self {
        Self(format!("sync-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    Created,
    Configured,
    Running,
    Finished,
    Aborted,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run instance created from a job handle.
///
/// Moves through `Created -> Configured -> Running -> {Finished, Aborted}`.
/// Terminal states are final; a new run always needs a new execution.
#[derive(Debug, Clone)]
pub struct SyncExecution {
    id: ExecutionId,
    job: JobHandle,
    name: String,
    options: SyncOptions,
    state: ExecutionState,
    result: ResultCode,
    status: Option<StatusCode>,
    started_at: Option<u64>,
    finished_at: Option<u64>,
}

impl SyncExecution {
    pub fn new(job: JobHandle, name: impl Into<String>) -> Self {
        Self {
            id: ExecutionId::generate(),
            job,
            name: name.into(),
            options: SyncOptions::default(),
            state: ExecutionState::Created,
            result: ResultCode::Unknown,
            status: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> &ExecutionId {
        &self.id
    }

    pub fn job(&self) -> &JobHandle {
        &self.job
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn result(&self) -> ResultCode {
        self.result
    }

    /// Status reported by the runner. Reads as `Running` until one is recorded.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Running)
    }

    pub fn outcome(&self) -> SyncOutcome {
        SyncOutcome::new(self.result(), self.status())
    }

    /// Epoch seconds at which the run started.
    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<u64> {
        self.finished_at
    }

    pub fn configure(&mut self, options: SyncOptions) -> Result<(), ExecutionError> {
        self.transition(ExecutionState::Created, ExecutionState::Configured)?;
        self.options = options;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ExecutionError> {
        self.transition(ExecutionState::Configured, ExecutionState::Running)?;
        self.started_at = Some(now_epoch_secs());
        Ok(())
    }

    /// Record the runner's result and status.
    ///
    /// A `Finished` status moves the execution to `Finished`, `Aborted` moves
    /// it to `Aborted`. A runner that reports `Running` leaves the execution
    /// running; the orchestrator then sees an unfinished outcome.
    pub fn finish(&mut self, result: ResultCode, status: StatusCode) -> Result<(), ExecutionError> {
        if self.state != ExecutionState::Running {
            return Err(ExecutionError::InvalidTransition {
                from: self.state,
                to: ExecutionState::Finished,
            });
        }

        self.result = result;
        self.status = Some(status);
        match status {
            StatusCode::Finished => self.state = ExecutionState::Finished,
            StatusCode::Aborted => self.state = ExecutionState::Aborted,
            StatusCode::Running => return Ok(()),
        }
        self.finished_at = Some(now_epoch_secs());
        Ok(())
    }

    /// Abort a running execution, e.g. after a deadline or a runner error.
    pub fn abort(&mut self) -> Result<(), ExecutionError> {
        self.transition(ExecutionState::Running, ExecutionState::Aborted)?;
        self.result = ResultCode::Unknown;
        self.status = Some(StatusCode::Aborted);
        self.finished_at = Some(now_epoch_secs());
        Ok(())
    }

    fn transition(
        &mut self,
        expected: ExecutionState,
        next: ExecutionState,
    ) -> Result<(), ExecutionError> {
        if self.state != expected {
            return Err(ExecutionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
