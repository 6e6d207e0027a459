//! Integration tests for layered configuration loading

use deltatree::config::ConfigLoader;
use deltatree::error::ApiError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_workspace_file(workspace: &Path, name: &str, contents: &str) {
    let dir = workspace.join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_environment_file_overrides_base() {
    let workspace = TempDir::new().unwrap();
    write_workspace_file(
        workspace.path(),
        "config.toml",
        r#"
[client]
message_endpoint = "http://localhost:8501/_messages"
fetch_timeout_ms = 1000

[logging]
level = "debug"
"#,
    );
    write_workspace_file(
        workspace.path(),
        "development.toml",
        "[client]\nfetch_timeout_ms = 250\n",
    );

    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    assert_eq!(
        config.client.message_endpoint.as_deref(),
        Some("http://localhost:8501/_messages")
    );
    assert_eq!(config.client.fetch_timeout_ms, 250);
    assert_eq!(config.client.default_max_cache_age, 2);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_workspace_overrides_global() {
    let global_dir = TempDir::new().unwrap();
    let global = global_dir.path().join("config.toml");
    fs::write(
        &global,
        "[client]\ndefault_max_cache_age = 7\nfetch_timeout_ms = 900\n",
    )
    .unwrap();

    let workspace = TempDir::new().unwrap();
    write_workspace_file(
        workspace.path(),
        "config.toml",
        "[client]\nfetch_timeout_ms = 300\n",
    );

    let config = ConfigLoader::load_with_global(workspace.path(), Some(&global)).unwrap();
    assert_eq!(config.client.default_max_cache_age, 7);
    assert_eq!(config.client.fetch_timeout_ms, 300);
}

#[test]
fn test_missing_global_file_is_ignored() {
    let workspace = TempDir::new().unwrap();
    let missing = workspace.path().join("nowhere.toml");
    let config = ConfigLoader::load_with_global(workspace.path(), Some(&missing)).unwrap();
    assert!(config.client.message_endpoint.is_none());
}

#[test]
fn test_validation_reports_every_section() {
    let workspace = TempDir::new().unwrap();
    write_workspace_file(
        workspace.path(),
        "config.toml",
        r#"
[client]
message_endpoint = "ftp://example.com"

[logging]
format = "xml"
"#,
    );

    let err = ConfigLoader::load_with_global(workspace.path(), None).unwrap_err();
    let ApiError::ConfigError(message) = err else {
        panic!("expected a configuration error, got {err:?}");
    };
    assert!(message.contains("message_endpoint"));
    assert!(message.contains("xml"));
}
