use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use crate::catalog::SyncJobDescriptor;
use crate::error::{StepError, SyncError};
use crate::feedback::{Feedback, FeedbackSink};
use crate::job::Importer;
use crate::options::SyncOptions;
use crate::orchestrator::SyncOrchestrator;
use crate::outcome::SyncDecision;

/// Shared inputs for every step of one catalog import.
#[derive(Debug, Clone)]
pub struct StepContext {
    import_root: PathBuf,
    catalog: String,
}

impl StepContext {
    pub fn new(import_root: impl Into<PathBuf>, catalog: impl Into<String>) -> Self {
        Self {
            import_root: import_root.into(),
            catalog: catalog.into(),
        }
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Substitute `{root}` and `{catalog}` in a template.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{root}", &self.import_root.to_string_lossy())
            .replace("{catalog}", &self.catalog)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    CompletedWithWarnings,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub status: StepStatus,
    pub detail: Option<String>,
}

impl StepReport {
    pub fn completed(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Completed,
            detail: Some(detail.into()),
        }
    }

    pub fn with_warnings(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::CompletedWithWarnings,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Skipped,
            detail: Some(reason.into()),
        }
    }
}

/// One named unit of a catalog import sequence.
#[async_trait::async_trait]
pub trait ImportStep: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: &StepContext) -> Result<StepReport, StepError>;
}

/// Reads a file and hands it to an [`Importer`].
pub struct ImportFileStep {
    name: String,
    path_template: String,
    legacy_mode: bool,
    importer: Arc<dyn Importer>,
}

impl ImportFileStep {
    /// `path_template` may use `{root}` and `{catalog}`.
    pub fn new(
        name: impl Into<String>,
        path_template: impl Into<String>,
        importer: Arc<dyn Importer>,
    ) -> Self {
        Self {
            name: name.into(),
            path_template: path_template.into(),
            legacy_mode: false,
            importer,
        }
    }

    pub fn legacy_mode(mut self, legacy_mode: bool) -> Self {
        self.legacy_mode = legacy_mode;
        self
    }
}

#[async_trait::async_trait]
impl ImportStep for ImportFileStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StepContext) -> Result<StepReport, StepError> {
        let path = ctx.expand(&self.path_template);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StepError::Io {
                step: self.name.clone(),
                path: path.clone(),
                source,
            })?;

        tracing::debug!(step = %self.name, %path, bytes = content.len(), "importing file");

        self.importer
            .import(&path, &content, self.legacy_mode)
            .await
            .map_err(|source| StepError::Import {
                step: self.name.clone(),
                source,
            })?;

        Ok(StepReport::completed(&self.name, path))
    }
}

/// What a [`SyncStep`] does when no synchronization job exists for its descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingJob {
    /// Skip the step; the target catalog simply has no incoming synchronization.
    Skip,
    #[default]
    Fail,
}

/// Runs one synchronization through a shared orchestrator.
pub struct SyncStep {
    name: String,
    orchestrator: Arc<SyncOrchestrator>,
    descriptor: SyncJobDescriptor,
    options: SyncOptions,
    on_missing: MissingJob,
    cancel: Option<watch::Receiver<bool>>,
}

impl SyncStep {
    pub fn new(
        name: impl Into<String>,
        orchestrator: Arc<SyncOrchestrator>,
        descriptor: SyncJobDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            orchestrator,
            descriptor,
            options: SyncOptions::default(),
            on_missing: MissingJob::default(),
            cancel: None,
        }
    }

    pub fn options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn on_missing(mut self, on_missing: MissingJob) -> Self {
        self.on_missing = on_missing;
        self
    }

    /// Abort the running job once `cancel` flips to `true`.
    pub fn cancel_on(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Resolves once the flag is set; never resolves if the sender goes away first.
async fn cancelled(cancel: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = cancel {
        let closed = rx.wait_for(|set| *set).await.is_err();
        if !closed {
            return;
        }
    }
    std::future::pending::<()>().await
}

#[async_trait::async_trait]
impl ImportStep for SyncStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &StepContext) -> Result<StepReport, StepError> {
        let cancel = cancelled(self.cancel.clone());
        match self
            .orchestrator
            .run_until(&self.descriptor, &self.options, cancel)
            .await
        {
            Ok(report) => {
                let detail = format!("{} via {}", report.outcome, report.job_code);
                match report.decision {
                    SyncDecision::Continue => Ok(StepReport::completed(&self.name, detail)),
                    SyncDecision::ContinueWithWarning | SyncDecision::Escalate => {
                        Ok(StepReport::with_warnings(&self.name, detail))
                    }
                }
            }
            Err(SyncError::InvalidDescriptor(target)) if self.on_missing == MissingJob::Skip => {
                let reason = format!("no incoming synchronizations for {target}");
                Ok(StepReport::skipped(&self.name, reason))
            }
            Err(source) => Err(StepError::Sync {
                step: self.name.clone(),
                source,
            }),
        }
    }
}

/// Per-step results of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub steps: Vec<StepReport>,
}

impl PipelineReport {
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// A pipeline stopped at a failing step.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct PipelineError {
    /// Steps that finished before the failure.
    pub completed: PipelineReport,
    #[source]
    pub source: StepError,
}

/// An ordered list of import steps supplied by the deployment.
pub struct ImportPipeline {
    steps: Vec<Box<dyn ImportStep>>,
    sink: Arc<dyn FeedbackSink>,
    cancel: Option<watch::Receiver<bool>>,
}

impl ImportPipeline {
    pub fn new(sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            steps: Vec::new(),
            sink,
            cancel: None,
        }
    }

    /// Stop before the next step once `cancel` flips to `true`.
    pub fn cancel_on(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn step(mut self, step: impl ImportStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn push(&mut self, step: Box<dyn ImportStep>) {
        self.steps.push(step);
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order, stopping at the first error.
    pub async fn run(&self, ctx: &StepContext) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport::default();
        let total = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
                let source = StepError::Cancelled {
                    step: step.name().to_owned(),
                };
                self.sink.emit(Feedback::warning(source.to_string()));
                return Err(PipelineError {
                    completed: report,
                    source,
                });
            }

            self.sink.emit(Feedback::info(format!(
                "[{}/{total}] {} ({})",
                index + 1,
                step.name(),
                ctx.catalog()
            )));

            match step.run(ctx).await {
                Ok(step_report) => {
                    if step_report.status == StepStatus::Skipped {
                        self.sink.emit(Feedback::info(format!(
                            "Skipped [{}]: {}",
                            step_report.step,
                            step_report.detail.as_deref().unwrap_or("")
                        )));
                    }
                    report.steps.push(step_report);
                }
                Err(source) => {
                    self.sink.emit(Feedback::error(source.to_string()));
                    return Err(PipelineError {
                        completed: report,
                        source,
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::catalog::CatalogVersion;
    use crate::outcome::{FailurePolicy, ResultCode, StatusCode, SyncOutcome};
    use crate::test_support::{
        InMemoryResolver, RecordingImporter, RecordingSink, ScriptedRunner, sample_descriptor,
    };

    use super::*;

    fn write_catalog_files(root: &Path, catalog: &str, files: &[&str]) {
        let dir = root
            .join("contentCatalogs")
            .join(format!("{catalog}ContentCatalog"));
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), format!("# {file}\nINSERT_UPDATE Item;code\n")).unwrap();
        }
    }

    fn file_template(file: &str) -> String {
        format!("{{root}}/contentCatalogs/{{catalog}}ContentCatalog/{file}")
    }

    fn orchestrator_with(
        resolver: InMemoryResolver,
        outcome: SyncOutcome,
        sink: Arc<RecordingSink>,
    ) -> Arc<SyncOrchestrator> {
        Arc::new(SyncOrchestrator::new(
            Arc::new(resolver),
            Arc::new(ScriptedRunner::returning(outcome)),
            sink,
        ))
    }

    #[test]
    fn context_expands_placeholders() {
        let ctx = StepContext::new("/impex", "electronics");
        assert_eq!(
            ctx.expand("{root}/contentCatalogs/{catalog}ContentCatalog/catalog.impex"),
            "/impex/contentCatalogs/electronicsContentCatalog/catalog.impex"
        );
    }

    #[tokio::test]
    async fn runs_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog_files(dir.path(), "electronics", &["catalog.impex", "cleaning.impex"]);

        let sink = Arc::new(RecordingSink::new());
        let importer = Arc::new(RecordingImporter::new());
        let mut resolver = InMemoryResolver::new();
        resolver.add_for(&sample_descriptor(), "sync-electronics-spa");
        let orch = orchestrator_with(resolver, SyncOutcome::succeeded(), sink.clone());

        let pipeline = ImportPipeline::new(sink.clone())
            .step(ImportFileStep::new(
                "create catalog",
                file_template("catalog.impex"),
                importer.clone(),
            ))
            .step(SyncStep::new("sync staged", orch, sample_descriptor()))
            .step(
                ImportFileStep::new("cleaning", file_template("cleaning.impex"), importer.clone())
                    .legacy_mode(true),
            );

        assert_eq!(
            pipeline.step_names(),
            vec!["create catalog", "sync staged", "cleaning"]
        );

        let ctx = StepContext::new(dir.path(), "electronics");
        let report = pipeline.run(&ctx).await.unwrap();

        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.count(StepStatus::Completed), 3);

        let imported = importer.imported();
        assert_eq!(imported.len(), 2);
        assert!(imported[0].path.ends_with("catalog.impex"));
        assert!(!imported[0].legacy_mode);
        assert!(imported[1].path.ends_with("cleaning.impex"));
        assert!(imported[1].legacy_mode);
        assert!(imported[1].content.contains("INSERT_UPDATE"));
    }

    #[tokio::test]
    async fn missing_job_is_skipped_when_configured() {
        let sink = Arc::new(RecordingSink::new());
        let orch = orchestrator_with(
            InMemoryResolver::new(),
            SyncOutcome::succeeded(),
            sink.clone(),
        );

        let pipeline = ImportPipeline::new(sink.clone()).step(
            SyncStep::new("sync staged", orch, sample_descriptor()).on_missing(MissingJob::Skip),
        );

        let report = pipeline
            .run(&StepContext::new("/impex", "electronics"))
            .await
            .unwrap();

        assert_eq!(report.count(StepStatus::Skipped), 1);
        assert!(
            sink.messages()
                .iter()
                .any(|m| m.starts_with("Skipped [sync staged]"))
        );
    }

    #[tokio::test]
    async fn missing_job_fails_by_default() {
        let sink = Arc::new(RecordingSink::new());
        let orch = orchestrator_with(
            InMemoryResolver::new(),
            SyncOutcome::succeeded(),
            sink.clone(),
        );

        let pipeline =
            ImportPipeline::new(sink).step(SyncStep::new("sync online", orch, sample_descriptor()));

        let err = pipeline
            .run(&StepContext::new("/impex", "electronics"))
            .await
            .unwrap_err();

        assert_eq!(err.source.step(), "sync online");
        assert!(matches!(
            err.source,
            StepError::Sync {
                source: SyncError::InvalidDescriptor(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failed_sync_continues_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog_files(dir.path(), "electronics", &["sync.impex"]);

        let sink = Arc::new(RecordingSink::new());
        let importer = Arc::new(RecordingImporter::new());
        let mut resolver = InMemoryResolver::new();
        resolver.add_for(&sample_descriptor(), "sync-electronics-spa");
        let orch = orchestrator_with(
            resolver,
            SyncOutcome::new(ResultCode::Failure, StatusCode::Finished),
            sink.clone(),
        );

        let pipeline = ImportPipeline::new(sink)
            .step(SyncStep::new("sync staged", orch, sample_descriptor()))
            .step(ImportFileStep::new(
                "permissions",
                file_template("sync.impex"),
                importer.clone(),
            ));

        let report = pipeline
            .run(&StepContext::new(dir.path(), "electronics"))
            .await
            .unwrap();

        assert_eq!(report.steps[0].status, StepStatus::CompletedWithWarnings);
        assert_eq!(report.steps[1].status, StepStatus::Completed);
        assert_eq!(importer.imported().len(), 1);
    }

    #[tokio::test]
    async fn strict_policy_stops_the_pipeline() {
        let sink = Arc::new(RecordingSink::new());
        let importer = Arc::new(RecordingImporter::new());
        let descriptor = SyncJobDescriptor::new(
            "electronics-spa staged->online",
            CatalogVersion::new("electronics-spaContentCatalog", "Staged"),
            CatalogVersion::new("electronics-spaContentCatalog", "Online"),
        );
        let mut resolver = InMemoryResolver::new();
        resolver.add_for(&descriptor, "sync-spa-online");
        let orch = Arc::new(
            SyncOrchestrator::new(
                Arc::new(resolver),
                Arc::new(ScriptedRunner::returning(SyncOutcome::aborted())),
                sink.clone(),
            )
            .with_policy(FailurePolicy::Strict),
        );

        let pipeline = ImportPipeline::new(sink)
            .step(SyncStep::new("sync online", orch, descriptor))
            .step(ImportFileStep::new(
                "email content",
                file_template("email-content.impex"),
                importer.clone(),
            ));

        let err = pipeline
            .run(&StepContext::new("/impex", "electronics"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.source,
            StepError::Sync {
                source: SyncError::Escalated { .. },
                ..
            }
        ));
        assert!(err.completed.steps.is_empty());
        assert!(importer.imported().is_empty());
    }

    #[tokio::test]
    async fn rejected_import_stops_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog_files(
            dir.path(),
            "electronics",
            &["catalog.impex", "test-data.impex", "email-content.impex"],
        );

        let sink = Arc::new(RecordingSink::new());
        let importer = Arc::new(RecordingImporter::new().rejecting("test-data.impex"));

        let pipeline = ImportPipeline::new(sink.clone())
            .step(ImportFileStep::new(
                "create catalog",
                file_template("catalog.impex"),
                importer.clone(),
            ))
            .step(ImportFileStep::new(
                "test data",
                file_template("test-data.impex"),
                importer.clone(),
            ))
            .step(ImportFileStep::new(
                "email content",
                file_template("email-content.impex"),
                importer.clone(),
            ));

        let err = pipeline
            .run(&StepContext::new(dir.path(), "electronics"))
            .await
            .unwrap_err();

        assert_eq!(err.source.step(), "test data");
        assert_eq!(err.completed.steps.len(), 1);
        assert_eq!(importer.imported().len(), 1);
        assert!(sink.records().last().unwrap().is_error());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ImportPipeline::new(Arc::new(RecordingSink::new())).step(
            ImportFileStep::new(
                "create catalog",
                file_template("catalog.impex"),
                Arc::new(RecordingImporter::new()),
            ),
        );

        let err = pipeline
            .run(&StepContext::new(dir.path(), "apparel"))
            .await
            .unwrap_err();

        match err.source {
            StepError::Io { path, .. } => {
                assert!(path.ends_with("apparelContentCatalog/catalog.impex"))
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_sync_step_aborts_its_job() {
        let sink = Arc::new(RecordingSink::new());
        let mut resolver = InMemoryResolver::new();
        resolver.add_for(&sample_descriptor(), "sync-electronics-spa");
        let runner = Arc::new(
            ScriptedRunner::returning(SyncOutcome::succeeded())
                .with_delay(Duration::from_secs(3600)),
        );
        let orch = Arc::new(SyncOrchestrator::new(
            Arc::new(resolver),
            runner.clone(),
            sink.clone(),
        ));

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let step = SyncStep::new("electronics->spa", orch, sample_descriptor())
            .cancel_on(cancel_rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel_tx.send(true).unwrap();
        });

        let report = step
            .run(&StepContext::new("/impex", "electronics"))
            .await
            .unwrap();

        assert_eq!(report.status, StepStatus::CompletedWithWarnings);
        assert_eq!(
            report.detail.as_deref(),
            Some("UNKNOWN/ABORTED via sync-electronics-spa")
        );
        assert_eq!(runner.calls().len(), 1);
        assert!(sink.messages().iter().any(|m| m.contains("was cancelled")));
    }

    #[tokio::test]
    async fn dropped_cancel_sender_never_cancels() {
        let sink = Arc::new(RecordingSink::new());
        let mut resolver = InMemoryResolver::new();
        resolver.add_for(&sample_descriptor(), "sync-electronics-spa");
        let orch = orchestrator_with(resolver, SyncOutcome::succeeded(), sink);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        drop(cancel_tx);
        let step = SyncStep::new("electronics->spa", orch, sample_descriptor())
            .cancel_on(cancel_rx);

        let report = step
            .run(&StepContext::new("/impex", "electronics"))
            .await
            .unwrap();

        assert_eq!(report.status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn cancelled_pipeline_stops_before_next_step() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog_files(dir.path(), "electronics", &["catalog.impex", "cleaning.impex"]);

        let sink = Arc::new(RecordingSink::new());
        let importer = Arc::new(RecordingImporter::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let pipeline = ImportPipeline::new(sink.clone())
            .cancel_on(cancel_rx)
            .step(ImportFileStep::new(
                "create catalog",
                file_template("catalog.impex"),
                importer.clone(),
            ))
            .step(ImportFileStep::new(
                "cleaning",
                file_template("cleaning.impex"),
                importer.clone(),
            ));
        let ctx = StepContext::new(dir.path(), "electronics");

        cancel_tx.send(true).unwrap();
        let err = pipeline.run(&ctx).await.unwrap_err();

        assert!(matches!(
            err.source,
            StepError::Cancelled { ref step } if step == "create catalog"
        ));
        assert!(err.completed.steps.is_empty());
        assert!(importer.imported().is_empty());
        assert!(sink.records().last().unwrap().is_warning());
    }
}
