//! Configuration loading entry point.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::DeltaTreeConfig;
use crate::error::ApiError;
use config::Environment;
use std::path::Path;
use tracing::debug;

/// Loads [`DeltaTreeConfig`] from all configured layers.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load using the user's global config file.
    pub fn load(workspace_root: &Path) -> Result<DeltaTreeConfig, ApiError> {
        Self::load_with_global(workspace_root, global_file::global_config_path().as_deref())
    }

    /// Load with an explicit global config file (or none).
    pub fn load_with_global(
        workspace_root: &Path,
        global_path: Option<&Path>,
    ) -> Result<DeltaTreeConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_path)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(
            Environment::with_prefix("DELTATREE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: DeltaTreeConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }
}
