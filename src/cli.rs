//! CLI domain: parse, route, output, and presentation only.
//! Pipeline behavior lives in the library; the route builds it from config and flags.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, GenerateArgs, PlanInputs};
pub use presentation::{
    format_dependencies_table, format_manifest_table, format_plan_summary, format_run_summary,
    TerminalProgress,
};
pub use route::RunContext;
