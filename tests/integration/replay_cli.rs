//! Integration tests for replaying recorded message streams from the CLI

use super::test_utils::{cacheable_text, delta_msg, finished, new_session, reference_to};
use deltatree::cli::{Commands, OutputFormat, RunContext};
use deltatree::config::DeltaTreeConfig;
use deltatree::element::Element;
use deltatree::protocol::{ForwardMsg, ScriptFinishedStatus};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_recording(dir: &Path, name: &str, messages: &[ForwardMsg]) -> PathBuf {
    let lines: Vec<String> = messages
        .iter()
        .map(|msg| serde_json::to_string(msg).unwrap())
        .collect();
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn context(workspace: &TempDir) -> RunContext {
    RunContext::with_config(workspace.path().to_path_buf(), DeltaTreeConfig::default())
}

fn two_runs() -> Vec<ForwardMsg> {
    let header = cacheable_text(&[0, 0], "title");
    vec![
        new_session("r1", "page", 2, &[]),
        header.clone(),
        delta_msg(&[0, 1], "page", None, Element::text("gone next run")),
        finished(ScriptFinishedStatus::FinishedOk),
        new_session("r2", "page", 2, &[]),
        reference_to(&header, &[0, 0]),
        delta_msg(&[1, 0], "page", None, Element::text("sidebar")),
        finished(ScriptFinishedStatus::FinishedOk),
    ]
}

#[tokio::test]
async fn test_replay_builds_final_tree() {
    let workspace = TempDir::new().unwrap();
    let path = write_recording(workspace.path(), "session.jsonl", &two_runs());

    let report = context(&workspace).replay(&path).await.unwrap();
    assert_eq!(report.messages, 8);
    assert!(report.failures.is_empty());
    assert_eq!(report.placeholders, 0);
    assert_eq!(report.cached_payloads, 1);
    assert_eq!(report.tree.generation_id(), "r2");
    assert_eq!(report.tree.main().children.len(), 1);
    assert_eq!(report.tree.sidebar().children.len(), 1);
}

#[tokio::test]
async fn test_unknown_reference_reported_without_fetch_endpoint() {
    let workspace = TempDir::new().unwrap();
    let never_sent = cacheable_text(&[0, 0], "never sent");
    let path = write_recording(
        workspace.path(),
        "missing.jsonl",
        &[
            new_session("r1", "page", 2, &[]),
            reference_to(&never_sent, &[0, 0]),
            delta_msg(&[0, 1], "page", None, Element::text("after")),
        ],
    );

    let report = context(&workspace).replay(&path).await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].starts_with("message 2"));
    // The message after the miss still lands, at its own path.
    assert!(report.tree.get_at(&[0, 1]).is_some());
}

#[tokio::test]
async fn test_execute_replay_as_json_with_relative_path() {
    let workspace = TempDir::new().unwrap();
    write_recording(workspace.path(), "session.jsonl", &two_runs());

    let output = context(&workspace)
        .execute(&Commands::Replay {
            file: PathBuf::from("session.jsonl"),
            format: OutputFormat::Json,
        })
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["generation"], "r2");
    assert_eq!(value["leaves"].as_array().unwrap().len(), 2);
    assert_eq!(value["leaves"][0]["section"], "main");
}

#[tokio::test]
async fn test_execute_config_prints_effective_settings() {
    let workspace = TempDir::new().unwrap();
    let output = context(&workspace).execute(&Commands::Config).await.unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["client"]["default_max_cache_age"], 2);
    assert_eq!(value["logging"]["output"], "stderr");
}

#[tokio::test]
async fn test_malformed_recording_rejected() {
    let workspace = TempDir::new().unwrap();
    let path = workspace.path().join("broken.jsonl");
    fs::write(&path, "{\"body\": 42}\n").unwrap();

    let err = context(&workspace).replay(&path).await.unwrap_err();
    assert!(err.to_string().contains("line 1"));
}
