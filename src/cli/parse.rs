//! CLI parse: clap types for smol-dev. No behavior; definitions only.

use crate::pipeline::{FailurePolicy, WriteMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// smol-dev - plan, agree on shared names, then generate a whole codebase file by file
#[derive(Parser, Debug)]
#[command(name = "smol-dev")]
#[command(about = "Generate a multi-file codebase from a natural-language prompt")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the manifest and shared dependencies once derived; debug-level logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log every prompt sent to the model
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable logging and progress output
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all stages and write generated files into the target directory
    Generate(GenerateArgs),
    /// Run the planning and shared-dependency stages only
    Plan(PlanInputs),
}

/// Inputs shared by every command.
#[derive(Args, Debug, Clone)]
pub struct PlanInputs {
    /// Prompt text, or a path to a file holding the prompt
    #[arg(long)]
    pub prompt: String,

    /// YAML file listing files to generate; read if non-empty, written after planning
    #[arg(long)]
    pub files_to_generate: Option<PathBuf>,

    /// YAML file of shared dependencies; read if non-empty, written after stage 2
    #[arg(long)]
    pub shared_deps: Option<PathBuf>,

    /// Model to use (overrides provider.model)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub inputs: PlanInputs,

    /// Directory generated files are written to
    #[arg(long, default_value = ".")]
    pub target_dir: PathBuf,

    /// Number of files generated concurrently (overrides pipeline.concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// What to do after a file fails: stop-submitting, continue, cancel-in-flight
    #[arg(long, value_parser = parse_failure_policy)]
    pub failure_policy: Option<FailurePolicy>,

    /// How files are written: atomic (rename on completion) or in-place
    #[arg(long, value_parser = parse_write_mode)]
    pub write_mode: Option<WriteMode>,
}

fn parse_failure_policy(s: &str) -> Result<FailurePolicy, String> {
    s.parse()
}

fn parse_write_mode(s: &str) -> Result<WriteMode, String> {
    s.parse()
}
