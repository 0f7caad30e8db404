use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a synchronization run succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    Failure,
    Unknown,
}

/// Whether a synchronization run reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Finished,
    Running,
    Aborted,
}

impl ResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Unrecognized codes read as `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "FAILURE" | "ERROR" => Self::Failure,
            _ => Self::Unknown,
        }
    }
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "FINISHED",
            Self::Running => "RUNNING",
            Self::Aborted => "ABORTED",
        }
    }

    /// Unrecognized codes read as `Aborted`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "FINISHED" => Self::Finished,
            "RUNNING" | "RUNNINGRESTART" => Self::Running,
            _ => Self::Aborted,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result and status read back from a completed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub result: ResultCode,
    pub status: StatusCode,
}

impl SyncOutcome {
    pub fn new(result: ResultCode, status: StatusCode) -> Self {
        Self { result, status }
    }

    pub fn succeeded() -> Self {
        Self::new(ResultCode::Success, StatusCode::Finished)
    }

    pub fn aborted() -> Self {
        Self::new(ResultCode::Unknown, StatusCode::Aborted)
    }

    pub fn is_clean(&self) -> bool {
        self.result == ResultCode::Success && self.status == StatusCode::Finished
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.result, self.status)
    }
}

/// What the pipeline should do after a synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncDecision {
    Continue,
    ContinueWithWarning,
    /// Only produced by [`FailurePolicy::Strict`].
    Escalate,
}

/// Classify an outcome under the default lenient policy.
///
/// Anything other than `SUCCESS/FINISHED` continues with a warning; a failed
/// sync never halts the pipeline here.
pub fn classify(outcome: &SyncOutcome) -> SyncDecision {
    FailurePolicy::Lenient.decide(outcome)
}

/// How a degraded synchronization outcome is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log and continue.
    #[default]
    Lenient,
    /// Escalate any outcome that is not `SUCCESS/FINISHED`.
    Strict,
}

impl FailurePolicy {
    pub fn decide(&self, outcome: &SyncOutcome) -> SyncDecision {
        if outcome.is_clean() {
            return SyncDecision::Continue;
        }
        match self {
            Self::Lenient => SyncDecision::ContinueWithWarning,
            Self::Strict => SyncDecision::Escalate,
        }
    }

    /// True when a rerun of the synchronization would be warranted.
    ///
    /// The orchestrator never reruns on its own; callers that want retries
    /// consult this and call `synchronize` again.
    pub fn rerun_needed(&self, outcome: &SyncOutcome) -> bool {
        !outcome.is_clean()
    }
}
