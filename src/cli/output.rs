//! CLI output: error mapping from pipeline errors to stable CLI surface.

use crate::error::PipelineError;

/// Map pipeline errors to a string for CLI output.
/// Aggregated generation failures list every failed path.
pub fn map_error(e: &PipelineError) -> String {
    match e {
        PipelineError::GenerationFailed(failure) => {
            let mut out = failure.to_string();
            for task in &failure.failures {
                out.push_str(&format!("\n  - {}: {}", task.path.display(), task.error));
            }
            for path in &failure.not_started {
                out.push_str(&format!("\n  - {}: not started", path.display()));
            }
            if !failure.written.is_empty() {
                out.push_str(&format!(
                    "\n{} file(s) were written and will be skipped on the next run.",
                    failure.written.len()
                ));
            }
            out
        }
        PipelineError::Cancelled => {
            "Run cancelled; files already written are kept and skipped on the next run."
                .to_string()
        }
        other => other.to_string(),
    }
}
