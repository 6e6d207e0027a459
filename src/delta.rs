//! Delta Application
//!
//! Interprets one structural edit from the server against the current root and
//! produces the next root.

use crate::element::{Element, NamedDataSet};
use crate::error::{DeltaError, TreeError};
use crate::tree::node::{AppNode, ContainerLayout, ContainerNode, LeafNode};
use crate::tree::root::AppRoot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, trace};

/// The edit a delta carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaKind {
    NewLeaf(Element),
    NewContainer(ContainerLayout),
    AppendToLeaf(NamedDataSet),
}

impl DeltaKind {
    pub fn name(&self) -> &'static str {
        match self {
            DeltaKind::NewLeaf(_) => "new_leaf",
            DeltaKind::NewContainer(_) => "new_container",
            DeltaKind::AppendToLeaf(_) => "append_to_leaf",
        }
    }
}

/// A delta with everything needed to apply it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaMsg {
    pub target_path: Vec<usize>,
    pub generation_id: String,
    pub owner_hash: String,
    pub fragment_id: Option<String>,
    pub kind: DeltaKind,
}

impl AppRoot {
    /// Apply `delta`, returning the new root. The receiver is left untouched.
    #[instrument(
        skip(self, delta),
        fields(path = ?delta.target_path, kind = delta.kind.name(), generation = %delta.generation_id)
    )]
    pub fn apply_delta(&self, delta: &DeltaMsg) -> Result<AppRoot, DeltaError> {
        let path = delta.target_path.as_slice();
        let generation_id = delta.generation_id.as_str();

        let node = match &delta.kind {
            DeltaKind::NewLeaf(element) => AppNode::Leaf(Arc::new(LeafNode::new(
                Arc::new(element.clone()),
                delta.owner_hash.clone(),
                generation_id,
                delta.fragment_id.clone(),
            ))),
            DeltaKind::NewContainer(layout) => {
                // Replacing a container keeps its children so live widget state survives.
                let children = match self.get_at(path) {
                    Some(AppNode::Container(existing)) => existing.children.clone(),
                    _ => Arc::new(Vec::new()),
                };
                trace!(carried_children = children.len(), "Building container");
                AppNode::Container(Arc::new(ContainerNode {
                    owner_hash: delta.owner_hash.clone(),
                    children,
                    layout: layout.clone(),
                    generation_id: generation_id.to_string(),
                    fragment_id: delta.fragment_id.clone(),
                }))
            }
            DeltaKind::AppendToLeaf(rows) => {
                let existing = match self.get_at(path) {
                    Some(AppNode::Leaf(leaf)) => leaf,
                    _ => return Err(TreeError::InvalidPath(path.to_vec()).into()),
                };
                AppNode::Leaf(Arc::new(existing.add_rows(rows, generation_id)?))
            }
        };

        Ok(self.set_at(path, node, generation_id)?)
    }
}
