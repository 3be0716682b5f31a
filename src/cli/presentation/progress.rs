//! Terminal progress: one coloured line per stage and task event, written to stderr.

use crate::error::Stage;
use crate::pipeline::{ProgressEvent, ProgressSink, StageSource};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::io::Write;
use std::time::Instant;

pub struct TerminalProgress {
    verbose: bool,
    started: Instant,
    out: Mutex<std::io::Stderr>,
}

impl TerminalProgress {
    /// With `verbose`, the manifest and shared dependencies are printed as YAML once known.
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            started: Instant::now(),
            out: Mutex::new(std::io::stderr()),
        }
    }

    fn render(&self, event: ProgressEvent) -> Option<String> {
        match event {
            ProgressEvent::StageStarted { stage } => {
                Some(format!("{} {}...", "▸".cyan(), stage_label(stage).bold()))
            }
            ProgressEvent::StageFinished { stage, source } => {
                let note = match source {
                    StageSource::Override => " (from override file)",
                    StageSource::Computed => "",
                };
                Some(format!(
                    "{} {}{} [{:.1}s]",
                    "✓".green(),
                    stage_label(stage),
                    note,
                    self.started.elapsed().as_secs_f32()
                ))
            }
            ProgressEvent::ManifestReady(manifest) if self.verbose => {
                let yaml = serde_yaml::to_string(manifest.paths()).ok()?;
                Some(format!("{}\n{}", "Files to generate:".bold(), yaml.trim_end()))
            }
            ProgressEvent::DependenciesReady(descriptor) if self.verbose => {
                let yaml = descriptor.to_yaml().ok()?;
                Some(format!("{}\n{}", "Shared dependencies:".bold(), yaml.trim_end()))
            }
            ProgressEvent::ManifestReady(_) | ProgressEvent::DependenciesReady(_) => None,
            ProgressEvent::TaskSkipped { index, total, path } => Some(format!(
                "{} {} {}",
                counter(index, total).dimmed(),
                path.display().dimmed(),
                "(exists, skipped)".dimmed()
            )),
            ProgressEvent::TaskStarted { index, total, path } => Some(format!(
                "{} generating {}",
                counter(index, total).cyan(),
                path.display()
            )),
            ProgressEvent::TaskAdvanced { .. } => None,
            ProgressEvent::TaskCompleted { path, bytes, .. } => Some(format!(
                "{} {} ({} bytes)",
                "✓".green(),
                path.display(),
                bytes
            )),
            ProgressEvent::TaskFailed { path, error, .. } => Some(format!(
                "{} {}: {}",
                "✗".red(),
                path.display(),
                error.red()
            )),
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn emit(&self, event: ProgressEvent) {
        if let Some(line) = self.render(event) {
            let mut out = self.out.lock();
            let _ = writeln!(out, "{}", line);
        }
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Plan => "Planning files",
        Stage::Dependencies => "Resolving shared dependencies",
        Stage::Content => "Generating files",
    }
}

fn counter(index: usize, total: usize) -> String {
    format!("[{}/{}]", index + 1, total)
}
