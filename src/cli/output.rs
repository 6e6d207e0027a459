//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;
use owo_colors::OwoColorize;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    let category = match e {
        ApiError::ConfigError(_) => "config",
        ApiError::IoError(_) => "io",
        ApiError::InvalidInput(_) => "input",
        ApiError::Codec(_) | ApiError::Dispatch(_) => "protocol",
    };
    format!("{} [{}] {}", "error".red().bold(), category, e)
}
