//! Global config file source: $XDG_CONFIG_HOME/smol-dev/config.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::PathBuf;
use tracing::debug;

/// Path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "smol-dev")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global config file to the builder if it exists.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.is_file() => {
            debug!(config_path = %path.display(), "Loading global configuration");
            builder.add_source(File::from(path).required(false))
        }
        _ => builder,
    }
}
