use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use catalog_sync::{
    CatalogVersion, FeedbackSink, ImportFileStep, ImportPipeline, Importer, PipelineReport,
    StepContext, StepStatus, SyncJobDescriptor, SyncOrchestrator, SyncStep, TracingSink,
};

use crate::commands;
use crate::config::{AppConfig, PipelineSection, StepConfig};

/// Build the configured step sequence for one catalog.
///
/// Setting `cancel` to `true` aborts a running sync step and stops the
/// pipeline before its next step.
pub fn build_pipeline(
    steps: &[StepConfig],
    ctx: &StepContext,
    importer: Arc<dyn Importer>,
    orchestrator: Arc<SyncOrchestrator>,
    sink: Arc<dyn FeedbackSink>,
    cancel: watch::Receiver<bool>,
) -> ImportPipeline {
    let mut pipeline = ImportPipeline::new(sink).cancel_on(cancel.clone());

    for step in steps {
        match step {
            StepConfig::Import {
                name,
                path,
                legacy_mode,
            } => {
                let name = name.clone().unwrap_or_else(|| step_name_from_path(path));
                pipeline.push(Box::new(
                    ImportFileStep::new(name, path.clone(), Arc::clone(&importer))
                        .legacy_mode(*legacy_mode),
                ));
            }
            StepConfig::Sync {
                name,
                source,
                target,
                on_missing,
                options,
            } => {
                let descriptor =
                    SyncJobDescriptor::new(name, expand(ctx, source), expand(ctx, target));
                pipeline.push(Box::new(
                    SyncStep::new(name, Arc::clone(&orchestrator), descriptor)
                        .options(*options)
                        .on_missing(*on_missing)
                        .cancel_on(cancel.clone()),
                ));
            }
        }
    }

    pipeline
}

fn expand(ctx: &StepContext, version: &CatalogVersion) -> CatalogVersion {
    CatalogVersion::new(ctx.expand(&version.catalog), ctx.expand(&version.version))
}

fn step_name_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned())
}

/// Run the configured pipeline and print a step summary.
pub async fn run(app: &AppConfig) -> Result<()> {
    let section: &PipelineSection = app
        .pipeline
        .as_ref()
        .context("config has no [pipeline] section")?;

    let store = Arc::new(commands::open_store(app)?);
    let client = commands::platform_client(app);
    let orchestrator = Arc::new(commands::orchestrator(
        client.clone(),
        store,
        section.policy,
        section.deadline_secs,
    ));

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let ctx = StepContext::new(&section.import_root, &section.catalog);
    let pipeline = build_pipeline(
        &app.steps,
        &ctx,
        client,
        orchestrator,
        Arc::new(TracingSink),
        cancel_rx,
    );
    if pipeline.is_empty() {
        anyhow::bail!("config has no [[steps]] to run");
    }

    println!(
        "Importing catalog [{}] ({} steps)...",
        section.catalog,
        pipeline.len()
    );

    match pipeline.run(&ctx).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            print_report(&e.completed);
            Err(anyhow::Error::new(e.source)
                .context(format!("pipeline for catalog [{}] stopped", section.catalog)))
        }
    }
}

fn print_report(report: &PipelineReport) {
    for step in &report.steps {
        let marker = match step.status {
            StepStatus::Completed => "ok  ",
            StepStatus::CompletedWithWarnings => "warn",
            StepStatus::Skipped => "skip",
        };
        println!(
            "  [{marker}] {}  {}",
            step.step,
            step.detail.as_deref().unwrap_or("")
        );
    }

    println!(
        "{} completed, {} with warnings, {} skipped.",
        report.count(StepStatus::Completed),
        report.count(StepStatus::CompletedWithWarnings),
        report.count(StepStatus::Skipped)
    );
}
