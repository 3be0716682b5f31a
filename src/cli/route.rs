//! CLI route: run context and command dispatch. Builds the provider stack from config and
//! hands each command to the pipeline orchestrator.

use crate::cli::parse::{Commands, GenerateArgs, PlanInputs};
use crate::cli::presentation::{format_plan_summary, format_run_summary, TerminalProgress};
use crate::config::{ConfigLoader, SmolDevConfig};
use crate::error::PipelineError;
use crate::pipeline::{NoopProgress, PipelineOrchestrator, ProgressSink, RunConfig};
use crate::provider::{ModelProviderClient, ProviderFactory};
use crate::stage::LlmStageAdapter;
use crate::types::Intent;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runtime context for CLI execution: loaded config plus output switches.
pub struct RunContext {
    config: SmolDevConfig,
    verbose: bool,
    debug: bool,
    quiet: bool,
}

impl RunContext {
    /// Load config from `config_path`, or from the layered sources rooted at the current
    /// directory.
    pub fn new(
        config_path: Option<PathBuf>,
        verbose: bool,
        debug: bool,
        quiet: bool,
    ) -> Result<Self, PipelineError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(Path::new("."))?,
        };
        Ok(Self::from_config(config, verbose, debug, quiet))
    }

    pub fn from_config(config: SmolDevConfig, verbose: bool, debug: bool, quiet: bool) -> Self {
        Self {
            config,
            verbose,
            debug,
            quiet,
        }
    }

    pub fn config(&self) -> &SmolDevConfig {
        &self.config
    }

    /// Execute a command on a fresh multi-threaded runtime. Ctrl-C cancels the run.
    pub fn execute(&self, command: &Commands) -> Result<String, PipelineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to start runtime: {}", e)))?;

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling run");
                interrupt.cancel();
            }
        });

        runtime.block_on(async {
            match command {
                Commands::Generate(args) => self.generate(args, &cancel).await,
                Commands::Plan(inputs) => self.plan(inputs, &cancel).await,
            }
        })
    }

    async fn generate(
        &self,
        args: &GenerateArgs,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let run = self.generate_config(args)?;
        let orchestrator = self.orchestrator(args.inputs.model.as_deref())?;
        info!(
            target_dir = %run.target_dir().display(),
            concurrency = run.concurrency,
            failure_policy = run.failure_policy.as_str(),
            write_mode = run.write_mode.as_str(),
            "Starting generation"
        );
        let report = orchestrator.run(&run, cancel).await?;
        Ok(format_run_summary(&report))
    }

    async fn plan(
        &self,
        inputs: &PlanInputs,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let run = self.run_config(inputs, PathBuf::from("."))?;
        let orchestrator = self.orchestrator(inputs.model.as_deref())?;
        let prepared = orchestrator.prepare(&run, cancel).await?;
        Ok(format_plan_summary(
            &prepared,
            run.manifest_override.as_deref(),
            run.dependencies_override.as_deref(),
        ))
    }

    fn run_config(&self, inputs: &PlanInputs, target_dir: PathBuf) -> Result<RunConfig, PipelineError> {
        let intent = Intent::resolve(&inputs.prompt)?;
        let settings = &self.config.pipeline;
        let mut run = RunConfig::new(intent, target_dir)
            .with_concurrency(settings.concurrency)
            .with_failure_policy(settings.failure_policy)
            .with_write_mode(settings.write_mode)
            .with_submit_delay(settings.submit_delay());
        if let Some(path) = &inputs.files_to_generate {
            run = run.with_manifest_override(path);
        }
        if let Some(path) = &inputs.shared_deps {
            run = run.with_dependencies_override(path);
        }
        Ok(run)
    }

    /// CLI flags win over config.
    fn generate_config(&self, args: &GenerateArgs) -> Result<RunConfig, PipelineError> {
        let mut run = self.run_config(&args.inputs, args.target_dir.clone())?;
        if let Some(concurrency) = args.concurrency {
            run = run.with_concurrency(concurrency);
        }
        if let Some(policy) = args.failure_policy {
            run = run.with_failure_policy(policy);
        }
        if let Some(mode) = args.write_mode {
            run = run.with_write_mode(mode);
        }
        run.validate()?;
        Ok(run)
    }

    fn orchestrator(&self, model: Option<&str>) -> Result<PipelineOrchestrator, PipelineError> {
        let mut provider = self.config.provider.clone();
        if let Some(model) = model {
            provider.model = model.to_string();
        }
        let model_provider = provider
            .to_model_provider()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let client: Arc<dyn ModelProviderClient> = Arc::from(
            ProviderFactory::create_client(&model_provider)
                .map_err(|e| PipelineError::Config(e.to_string()))?,
        );
        info!(
            provider = client.provider_name(),
            model = client.model_name(),
            "Model provider ready"
        );

        let adapter = Arc::new(
            LlmStageAdapter::new(client, provider.default_options.clone())
                .with_debug_prompts(self.debug),
        );
        let progress: Arc<dyn ProgressSink> = if self.quiet {
            Arc::new(NoopProgress)
        } else {
            Arc::new(TerminalProgress::new(self.verbose))
        };
        Ok(PipelineOrchestrator::from_adapter(adapter).with_progress(progress))
    }
}
