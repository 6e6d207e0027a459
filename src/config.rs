//! Configuration System
//!
//! Layered runtime configuration: built-in defaults, the user's global file,
//! workspace files and finally `DELTATREE__SECTION__KEY` environment overrides.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Runs a payload stays cached without being referenced, unless a run says otherwise.
pub const DEFAULT_MAX_CACHE_AGE: u64 = 2;

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaTreeConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Message client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint serving cached messages by hash. Without it a cache miss is fatal.
    #[serde(default)]
    pub message_endpoint: Option<String>,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Cache age threshold used until a run announces its own.
    #[serde(default = "default_max_cache_age")]
    pub default_max_cache_age: u64,
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

fn default_max_cache_age() -> u64 {
    DEFAULT_MAX_CACHE_AGE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            message_endpoint: None,
            fetch_timeout_ms: default_fetch_timeout_ms(),
            default_max_cache_age: default_max_cache_age(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.message_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "message_endpoint must be an http(s) URL, got '{}'",
                    endpoint
                ));
            }
        }
        if self.fetch_timeout_ms == 0 {
            return Err("fetch_timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Client(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Client(msg) => write!(f, "Client: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl DeltaTreeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.client.validate() {
            errors.push(ValidationError::Client(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
