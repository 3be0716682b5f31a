//! Configuration sources, lowest precedence first.

pub mod global_file;
pub mod workspace_file;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const ENV_PREFIX: &str = "SMOL_DEV";
pub const ENV_SEPARATOR: &str = "__";

/// `SMOL_DEV__PIPELINE__CONCURRENCY=3` sets `pipeline.concurrency`.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    )
}
