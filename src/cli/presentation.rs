//! CLI presentation: terminal progress and result formatters.

mod progress;
mod summary;

pub use progress::TerminalProgress;
pub use summary::{
    format_dependencies_table, format_manifest_table, format_plan_summary, format_run_summary,
};
