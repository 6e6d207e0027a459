//! CLI presentation: text and json formatters for replay and config output.

use crate::cli::route::ReplayReport;
use crate::config::DeltaTreeConfig;
use crate::error::ApiError;
use crate::tree::node::AppNode;
use crate::tree::root::{AppRoot, Section};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// One leaf of the tree, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafRow {
    pub path: Vec<usize>,
    pub section: &'static str,
    pub kind: &'static str,
    pub generation: String,
    pub fragment: Option<String>,
    pub owner: String,
}

/// Every leaf in rendering order.
pub fn leaf_rows(root: &AppRoot) -> Vec<LeafRow> {
    let mut rows = Vec::new();
    for (index, section) in Section::ALL.iter().enumerate() {
        for (child_index, child) in root.section(*section).children.iter().enumerate() {
            collect_rows(child, vec![index, child_index], section.name(), &mut rows);
        }
    }
    rows
}

fn collect_rows(node: &AppNode, path: Vec<usize>, section: &'static str, rows: &mut Vec<LeafRow>) {
    match node {
        AppNode::Container(container) => {
            for (index, child) in container.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(index);
                collect_rows(child, child_path, section, rows);
            }
        }
        AppNode::Leaf(leaf) => rows.push(LeafRow {
            path,
            section,
            kind: leaf.element.kind(),
            generation: leaf.generation_id.clone(),
            fragment: leaf.fragment_id.clone(),
            owner: leaf.owner_hash.clone(),
        }),
    }
}

fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_replay_table(report: &ReplayReport) -> String {
    let rows = leaf_rows(&report.tree);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Path", "Section", "Kind", "Generation", "Fragment", "Owner"]);
    for row in &rows {
        let path = row
            .path
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(".");
        table.add_row(vec![
            path,
            row.section.to_string(),
            row.kind.to_string(),
            row.generation.clone(),
            row.fragment.clone().unwrap_or_else(|| "-".to_string()),
            row.owner.clone(),
        ]);
    }

    let mut out = format!(
        "{}\n  Messages: {}\n  Leaves: {}\n  Cached payloads: {}\n  Error elements: {}",
        heading("Replay"),
        report.messages,
        rows.len(),
        report.cached_payloads,
        report.placeholders
    );
    if let Some(logo) = report.tree.logo() {
        out.push_str(&format!("\n  Logo: {} (owner {})", logo.logo.image, logo.owner_hash));
    }
    if !report.failures.is_empty() {
        out.push_str(&format!("\n\n{}", heading("Failures")));
        for failure in &report.failures {
            out.push_str(&format!("\n  - {}", failure.red()));
        }
    }
    if !rows.is_empty() {
        out.push_str(&format!("\n\n{}\n{}", heading("Tree"), table));
    }
    out
}

pub fn format_replay_json(report: &ReplayReport) -> Result<String, ApiError> {
    let out = serde_json::json!({
        "messages": report.messages,
        "generation": report.tree.generation_id(),
        "owner": report.tree.owner_hash(),
        "cached_payloads": report.cached_payloads,
        "error_elements": report.placeholders,
        "failures": report.failures,
        "leaves": leaf_rows(&report.tree),
    });
    serde_json::to_string_pretty(&out)
        .map_err(|e| ApiError::InvalidInput(format!("Failed to render JSON: {}", e)))
}

pub fn format_config_json(config: &DeltaTreeConfig) -> Result<String, ApiError> {
    serde_json::to_string_pretty(config)
        .map_err(|e| ApiError::InvalidInput(format!("Failed to render JSON: {}", e)))
}
