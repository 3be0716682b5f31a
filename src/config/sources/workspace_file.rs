//! Workspace config file source: smol-dev.toml and smol-dev.{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_NAME_VAR: &str = "SMOL_DEV_ENV";

/// Workspace config files in load order: base, then the `SMOL_DEV_ENV` variant if set.
pub fn workspace_config_paths(workspace_root: &Path) -> Vec<PathBuf> {
    let mut paths = vec![workspace_root.join("smol-dev.toml")];
    if let Ok(env_name) = std::env::var(ENV_NAME_VAR) {
        if !env_name.trim().is_empty() {
            paths.push(workspace_root.join(format!("smol-dev.{}.toml", env_name.trim())));
        }
    }
    paths
}

/// Add workspace config files to the builder.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    for path in workspace_config_paths(workspace_root) {
        if path.is_file() {
            debug!(config_path = %path.display(), "Loading workspace configuration");
            builder = builder.add_source(File::from(path).required(false));
        }
    }
    builder
}
