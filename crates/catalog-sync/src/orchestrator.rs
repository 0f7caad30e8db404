use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{JobHandle, SyncJobDescriptor};
use crate::error::SyncError;
use crate::execution::{ExecutionId, SyncExecution};
use crate::feedback::{Feedback, FeedbackSink};
use crate::job::{ExecutionJournal, JobResolver, JobRunner};
use crate::options::SyncOptions;
use crate::outcome::{FailurePolicy, SyncDecision, SyncOutcome};

/// Bounds on a single synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncLimits {
    /// Abort the run when the job has not completed within this duration.
    pub deadline: Option<Duration>,
}

/// Outcome of one orchestrated run together with the decision taken on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub execution_id: ExecutionId,
    pub job_code: String,
    pub outcome: SyncOutcome,
    pub decision: SyncDecision,
}

enum Interruption {
    Deadline(Duration),
    Cancelled,
}

/// Drives a synchronization job for one catalog-version pair.
///
/// Each call resolves the descriptor, creates a fresh execution, applies the
/// options and waits for the runner to finish. Degraded outcomes are returned
/// as data; only an unresolvable descriptor is an error. The orchestrator
/// never reruns a job on its own.
pub struct SyncOrchestrator {
    resolver: Arc<dyn JobResolver>,
    runner: Arc<dyn JobRunner>,
    sink: Arc<dyn FeedbackSink>,
    journal: Option<Arc<dyn ExecutionJournal>>,
    policy: FailurePolicy,
    limits: SyncLimits,
}

impl SyncOrchestrator {
    pub fn new(
        resolver: Arc<dyn JobResolver>,
        runner: Arc<dyn JobRunner>,
        sink: Arc<dyn FeedbackSink>,
    ) -> Self {
        Self {
            resolver,
            runner,
            sink,
            journal: None,
            policy: FailurePolicy::default(),
            limits: SyncLimits::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: SyncLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn ExecutionJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Resolve a descriptor to the job handle that will serve it.
    pub async fn resolve(&self, descriptor: &SyncJobDescriptor) -> Result<JobHandle, SyncError> {
        let handles = self.resolver.resolve(descriptor).await?;
        tracing::debug!(
            descriptor = %descriptor,
            candidates = handles.len(),
            "resolved synchronization jobs"
        );
        handles
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::InvalidDescriptor(descriptor.to_string()))
    }

    /// Run one synchronization and return its outcome.
    pub async fn synchronize(
        &self,
        descriptor: &SyncJobDescriptor,
        options: &SyncOptions,
    ) -> Result<SyncOutcome, SyncError> {
        self.synchronize_until(descriptor, options, std::future::pending())
            .await
    }

    /// Like [`synchronize`](Self::synchronize), but aborts the run when
    /// `cancel` completes first.
    pub async fn synchronize_until<F>(
        &self,
        descriptor: &SyncJobDescriptor,
        options: &SyncOptions,
        cancel: F,
    ) -> Result<SyncOutcome, SyncError>
    where
        F: Future<Output = ()> + Send,
    {
        let report = self.execute(descriptor, options, cancel).await?;
        Ok(report.outcome)
    }

    /// Classify an outcome under this orchestrator's failure policy.
    pub fn classify(&self, outcome: &SyncOutcome) -> SyncDecision {
        self.policy.decide(outcome)
    }

    /// Synchronize and classify in one go.
    ///
    /// Under the strict policy an escalated decision comes back as
    /// [`SyncError::Escalated`].
    pub async fn run(
        &self,
        descriptor: &SyncJobDescriptor,
        options: &SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        self.run_until(descriptor, options, std::future::pending())
            .await
    }

    /// Like [`run`](Self::run), but aborts the job when `cancel` completes first.
    pub async fn run_until<F>(
        &self,
        descriptor: &SyncJobDescriptor,
        options: &SyncOptions,
        cancel: F,
    ) -> Result<SyncReport, SyncError>
    where
        F: Future<Output = ()> + Send,
    {
        let report = self.execute(descriptor, options, cancel).await?;

        if report.decision == SyncDecision::Escalate {
            return Err(SyncError::Escalated {
                name: descriptor.name().to_owned(),
                outcome: report.outcome,
            });
        }
        Ok(report)
    }

    async fn execute<F>(
        &self,
        descriptor: &SyncJobDescriptor,
        options: &SyncOptions,
        cancel: F,
    ) -> Result<SyncReport, SyncError>
    where
        F: Future<Output = ()> + Send,
    {
        let job = self.resolve(descriptor).await?;
        let name = descriptor.name();
        let mut log = Vec::new();

        self.checkpoint(
            &mut log,
            Feedback::info(format!("Begin synchronizing catalog [{name}]")),
        );

        let mut execution = SyncExecution::new(job.clone(), name);
        execution.configure(*options)?;
        tracing::debug!(
            execution = %execution.id(),
            job = %job,
            mode = %options.mode,
            force_update = options.force_update,
            "configured execution"
        );

        self.checkpoint(
            &mut log,
            Feedback::info("Starting synchronization, this may take a while ..."),
        );
        execution.start()?;

        let deadline = self.limits.deadline;
        let expiry = async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let completed = tokio::select! {
            result = self.runner.perform(&job, &mut execution, true) => Ok(result),
            _ = expiry => Err(Interruption::Deadline(deadline.unwrap_or_default())),
            _ = cancel => Err(Interruption::Cancelled),
        };

        match completed {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.checkpoint(
                    &mut log,
                    Feedback::warning(format!("Synchronization job [{job}] failed: {e}")),
                );
                if !execution.state().is_terminal() {
                    execution.abort()?;
                }
            }
            Err(interruption) => {
                let msg = match interruption {
                    Interruption::Deadline(limit) => format!(
                        "Synchronization of catalog [{name}] exceeded its deadline of {}s",
                        limit.as_secs()
                    ),
                    Interruption::Cancelled => {
                        format!("Synchronization of catalog [{name}] was cancelled")
                    }
                };
                self.checkpoint(&mut log, Feedback::warning(msg));
                if !execution.state().is_terminal() {
                    execution.abort()?;
                }
            }
        }

        self.checkpoint(
            &mut log,
            Feedback::info(format!("Synchronization complete for catalog [{name}]")),
        );

        let outcome = execution.outcome();
        let decision = self.policy.decide(&outcome);
        if self.policy.rerun_needed(&outcome) {
            self.checkpoint(
                &mut log,
                Feedback::warning(format!("Catalog [{name}] sync has issues.")),
            );
        }

        self.checkpoint(
            &mut log,
            Feedback::info(format!("Done synchronizing catalog [{name}]")),
        );

        self.journal(&execution, log).await;

        Ok(SyncReport {
            execution_id: execution.id().clone(),
            job_code: job.code().to_owned(),
            outcome,
            decision,
        })
    }

    fn checkpoint(&self, log: &mut Vec<Feedback>, feedback: Feedback) {
        log.push(feedback.clone());
        self.sink.emit(feedback);
    }

    async fn journal(&self, execution: &SyncExecution, log: Vec<Feedback>) {
        let Some(journal) = &self.journal else {
            return;
        };

        let kept: &[Feedback] = if execution.options().persist_to_store {
            &log
        } else {
            &[]
        };

        if let Err(e) = journal.record(execution, kept).await {
            self.sink.emit(Feedback::warning(format!(
                "could not record execution {}: {e}",
                execution.id()
            )));
        }
    }
}
