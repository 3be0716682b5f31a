//! Pipeline orchestrator: resolves the manifest and shared dependencies (from overrides or
//! the stage providers), then fans per-file generation out over a bounded [`TaskPool`].

use crate::error::{GenerationFailure, PipelineError, Stage, TaskFailure};
use crate::overrides;
use crate::pipeline::pool::{Submission, TaskPool};
use crate::pipeline::progress::{
    ProgressEvent, ProgressHandle, ProgressSink, StageSource, TracingProgress,
};
use crate::pipeline::writer::{self, StreamingFileWriter, WriteMode};
use crate::pipeline::RunConfig;
use crate::stage::{ContentGenerator, DependencyProvider, LlmStageAdapter, PlanProvider};
use crate::types::{DependencyDescriptor, FileManifest, GenerationContext};
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of stages 1 and 2.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub manifest: FileManifest,
    pub dependencies: DependencyDescriptor,
    pub manifest_source: StageSource,
    pub dependencies_source: StageSource,
}

/// Outcome of a fully successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub manifest: FileManifest,
    /// Files generated by this run, in manifest order.
    pub written: Vec<PathBuf>,
    /// Files left untouched because they already had content.
    pub skipped: Vec<PathBuf>,
}

pub struct PipelineOrchestrator {
    planner: Arc<dyn PlanProvider>,
    dependencies: Arc<dyn DependencyProvider>,
    generator: Arc<dyn ContentGenerator>,
    progress: Arc<dyn ProgressSink>,
}

impl PipelineOrchestrator {
    pub fn new(
        planner: Arc<dyn PlanProvider>,
        dependencies: Arc<dyn DependencyProvider>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            planner,
            dependencies,
            generator,
            progress: Arc::new(TracingProgress),
        }
    }

    /// All three stages backed by one LLM adapter.
    pub fn from_adapter(adapter: Arc<LlmStageAdapter>) -> Self {
        Self::new(adapter.clone(), adapter.clone(), adapter)
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Run all three stages. Succeeds only when every non-skipped file was written.
    pub async fn run(
        &self,
        config: &RunConfig,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        config.validate()?;
        writer::ensure_dir(config.target_dir()).await?;
        let prepared = self.prepare(config, cancel).await?;
        self.generate(config, prepared, cancel).await
    }

    /// Stages 1 and 2 only: resolve the manifest and the shared dependencies, writing computed
    /// values back to the configured override paths.
    pub async fn prepare(
        &self,
        config: &RunConfig,
        cancel: &CancellationToken,
    ) -> Result<PreparedRun, PipelineError> {
        config.validate()?;

        let (manifest, manifest_source) = self.resolve_manifest(config, cancel).await?;
        self.progress.emit(ProgressEvent::ManifestReady(manifest.clone()));

        let (dependencies, dependencies_source) =
            self.resolve_dependencies(config, &manifest, cancel).await?;
        self.progress
            .emit(ProgressEvent::DependenciesReady(dependencies.clone()));

        Ok(PreparedRun {
            manifest,
            dependencies,
            manifest_source,
            dependencies_source,
        })
    }

    async fn resolve_manifest(
        &self,
        config: &RunConfig,
        cancel: &CancellationToken,
    ) -> Result<(FileManifest, StageSource), PipelineError> {
        if let Some(path) = &config.manifest_override {
            if let Some(manifest) = overrides::load_manifest(path).await? {
                info!(path = %path.display(), files = manifest.len(), "Using manifest override");
                self.finish_stage(Stage::Plan, StageSource::Override);
                return Ok((manifest, StageSource::Override));
            }
        }

        self.progress
            .emit(ProgressEvent::StageStarted { stage: Stage::Plan });
        let manifest = cancellable(cancel, self.planner.plan(&config.intent)).await?;
        if let Some(path) = &config.manifest_override {
            overrides::store_manifest(path, &manifest).await?;
        }
        self.finish_stage(Stage::Plan, StageSource::Computed);
        Ok((manifest, StageSource::Computed))
    }

    async fn resolve_dependencies(
        &self,
        config: &RunConfig,
        manifest: &FileManifest,
        cancel: &CancellationToken,
    ) -> Result<(DependencyDescriptor, StageSource), PipelineError> {
        if let Some(path) = &config.dependencies_override {
            if let Some(descriptor) = overrides::load_dependencies(path).await? {
                info!(path = %path.display(), "Using shared dependency override");
                self.finish_stage(Stage::Dependencies, StageSource::Override);
                return Ok((descriptor, StageSource::Override));
            }
        }

        self.progress.emit(ProgressEvent::StageStarted {
            stage: Stage::Dependencies,
        });
        let descriptor = cancellable(
            cancel,
            self.dependencies.dependencies(&config.intent, manifest),
        )
        .await?;
        if descriptor.is_empty() {
            warn!("No shared dependencies identified");
        }
        if let Some(path) = &config.dependencies_override {
            overrides::store_dependencies(path, &descriptor).await?;
        }
        self.finish_stage(Stage::Dependencies, StageSource::Computed);
        Ok((descriptor, StageSource::Computed))
    }

    fn finish_stage(&self, stage: Stage, source: StageSource) {
        self.progress
            .emit(ProgressEvent::StageFinished { stage, source });
    }

    /// Stage 3: generate every manifest entry that is not already present.
    pub async fn generate(
        &self,
        config: &RunConfig,
        prepared: PreparedRun,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        config.validate()?;
        let target_dir = config.target_dir().to_path_buf();
        writer::ensure_dir(&target_dir).await?;

        let context = Arc::new(GenerationContext::new(
            config.intent.clone(),
            prepared.manifest,
            prepared.dependencies,
        )?);
        let total = context.manifest.len();
        self.progress.emit(ProgressEvent::StageStarted {
            stage: Stage::Content,
        });

        let mut pool = TaskPool::new(
            config.concurrency,
            config.failure_policy,
            cancel,
            config.submit_delay,
        );
        let mut destinations: Vec<Option<PathBuf>> = vec![None; total];
        let mut skipped = Vec::new();
        let mut not_started = Vec::new();
        let mut halted = false;

        for (index, relative) in context.manifest.iter().enumerate() {
            let destination = writer::resolve_destination(&target_dir, relative);
            if halted || cancel.is_cancelled() {
                not_started.push(destination);
                continue;
            }
            if writer::is_present(&destination).await {
                self.progress.emit(ProgressEvent::TaskSkipped {
                    index,
                    total,
                    path: destination.clone(),
                });
                skipped.push(destination);
                continue;
            }

            let task = generate_file(
                self.generator.clone(),
                context.clone(),
                self.progress.clone(),
                FileTask {
                    index,
                    total,
                    relative: relative.to_string(),
                    destination: destination.clone(),
                    mode: config.write_mode,
                },
            );
            match pool.submit(index, task).await {
                Submission::Accepted => destinations[index] = Some(destination),
                Submission::Halted => {
                    debug!(task = index, "Submission halted after failure");
                    halted = true;
                    not_started.push(destination);
                }
                Submission::Cancelled => not_started.push(destination),
            }
        }

        let outcomes = pool.join_all().await;
        self.progress.emit(ProgressEvent::StageFinished {
            stage: Stage::Content,
            source: StageSource::Computed,
        });

        let mut written = Vec::new();
        let mut failures = Vec::new();
        for (index, result) in outcomes {
            let Some(path) = destinations[index].take() else {
                continue;
            };
            match result {
                Ok(_) => written.push(path),
                Err(error) => failures.push(TaskFailure { index, path, error }),
            }
        }

        if cancel.is_cancelled() {
            info!(
                written = written.len(),
                not_started = not_started.len(),
                "Run cancelled"
            );
            return Err(PipelineError::Cancelled);
        }

        if !failures.is_empty() || !not_started.is_empty() {
            // Real failures first; tasks cancelled by the policy trail them.
            failures.sort_by_key(|f| (f.error.is_cancelled(), f.index));
            return Err(PipelineError::GenerationFailed(GenerationFailure {
                failures,
                written,
                not_started,
                total,
            }));
        }

        info!(
            written = written.len(),
            skipped = skipped.len(),
            "Generation complete"
        );
        Ok(RunReport {
            manifest: context.manifest.clone(),
            written,
            skipped,
        })
    }
}

struct FileTask {
    index: usize,
    total: usize,
    relative: String,
    destination: PathBuf,
    mode: WriteMode,
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = call => result,
    }
}

async fn generate_file(
    generator: Arc<dyn ContentGenerator>,
    context: Arc<GenerationContext>,
    progress: Arc<dyn ProgressSink>,
    task: FileTask,
) -> Result<u64, PipelineError> {
    let mut handle = ProgressHandle::start(progress, task.index, task.total, &task.destination);
    let outcome = async {
        let mut stream = generator.generate(&task.relative, &context).await?;
        let mut file = StreamingFileWriter::create(&task.destination, task.mode).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_chunk(&chunk).await?;
            handle.advance(chunk.len());
        }
        file.commit().await
    }
    .await;
    match &outcome {
        Ok(_) => handle.complete(),
        Err(e) => handle.fail(e),
    }
    outcome
}
