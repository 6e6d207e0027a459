//! Merge rules: defaults, override order, conflict handling.

use crate::config::{DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_CACHE_AGE};
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("client.fetch_timeout_ms", DEFAULT_FETCH_TIMEOUT_MS)?
        .set_default("client.default_max_cache_age", DEFAULT_MAX_CACHE_AGE)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
