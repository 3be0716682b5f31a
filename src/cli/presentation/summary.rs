//! Result formatters for `generate` and `plan`.

use crate::pipeline::{PreparedRun, RunReport, StageSource};
use crate::types::{DependencyDescriptor, FileManifest};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::path::Path;

pub fn format_manifest_table(manifest: &FileManifest) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Path"]);
    for (index, path) in manifest.iter().enumerate() {
        table.add_row(vec![(index + 1).to_string(), path.to_string()]);
    }
    table.to_string()
}

pub fn format_dependencies_table(descriptor: &DependencyDescriptor) -> String {
    if descriptor.is_empty() {
        return "No shared dependencies.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Description", "Symbols"]);
    for dep in &descriptor.shared_dependencies {
        let symbols: Vec<&str> = dep.symbols.keys().map(String::as_str).collect();
        table.add_row(vec![
            dep.name.clone(),
            dep.description.clone(),
            symbols.join(", "),
        ]);
    }
    table.to_string()
}

fn source_label(source: StageSource) -> &'static str {
    match source {
        StageSource::Override => "override file",
        StageSource::Computed => "model",
    }
}

/// `plan` output: both tables plus where each value came from and where it was saved.
pub fn format_plan_summary(
    prepared: &PreparedRun,
    manifest_path: Option<&Path>,
    dependencies_path: Option<&Path>,
) -> String {
    let mut out = format!(
        "Files ({} from {}):\n{}\n\nShared dependencies (from {}):\n{}",
        prepared.manifest.len(),
        source_label(prepared.manifest_source),
        format_manifest_table(&prepared.manifest),
        source_label(prepared.dependencies_source),
        format_dependencies_table(&prepared.dependencies),
    );
    match manifest_path {
        Some(path) => out.push_str(&format!("\n\nFile list saved to {}", path.display())),
        None => out.push_str("\n\nPass --files-to-generate to save the file list for editing."),
    }
    if let Some(path) = dependencies_path {
        out.push_str(&format!("\nShared dependencies saved to {}", path.display()));
    }
    out
}

pub fn format_run_summary(report: &RunReport) -> String {
    let mut out = format!(
        "Generated {} of {} file(s)",
        report.written.len(),
        report.manifest.len()
    );
    if !report.skipped.is_empty() {
        out.push_str(&format!(
            ", skipped {} already present",
            report.skipped.len()
        ));
    }
    for path in &report.written {
        out.push_str(&format!("\n  {}", path.display()));
    }
    out
}
