//! Merge rules: defaults applied beneath every other source.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("provider.provider_type", "openai")?
        .set_default("provider.model", crate::provider::profile::DEFAULT_MODEL)?
        .set_default("pipeline.concurrency", 5_i64)?
        .set_default("pipeline.submit_delay_ms", 1_i64)?
        .set_default("pipeline.failure_policy", "stop_submitting")?
        .set_default("pipeline.write_mode", "atomic")?
        .set_default("logging.level", "info")?
        .set_default("logging.output", "stderr")
}
