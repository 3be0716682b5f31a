//! Config loader: assembles sources in precedence order and deserializes the result.

use super::{merge, sources, SmolDevConfig};
use crate::error::PipelineError;
use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::Path;
use tracing::debug;

/// Loads [`SmolDevConfig`].
///
/// Precedence, low to high: built-in defaults, the global file
/// (`$XDG_CONFIG_HOME/smol-dev/config.toml`), `smol-dev.toml` in the workspace,
/// `smol-dev.{SMOL_DEV_ENV}.toml`, then `SMOL_DEV__SECTION__KEY` environment variables.
/// CLI flags are applied on top by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(workspace_root: &Path) -> Result<SmolDevConfig, PipelineError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder);
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root);
        Self::finish(sources::add_environment(builder))
    }

    /// Load an explicit file in place of the global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<SmolDevConfig, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        Self::finish(sources::add_environment(builder))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<SmolDevConfig, PipelineError> {
        let config: SmolDevConfig = builder.build()?.try_deserialize()?;
        config.check()?;
        debug!(
            provider = ?config.provider.provider_type,
            model = %config.provider.model,
            concurrency = config.pipeline.concurrency,
            "Configuration loaded"
        );
        Ok(config)
    }
}
